//! v2 endpoints: clubs and games.

use bon::Builder;

use crate::http::ApiRequest;

use super::{ApiVersion, CompetitionCode};

#[derive(Debug, Clone, Builder)]
pub struct ClubsQuery {
    #[builder(default = 20)]
    pub limit: u32,
    #[builder(default)]
    pub offset: u32,
    pub has_parent_club: Option<bool>,
    #[builder(into)]
    pub search: Option<String>,
}

impl Default for ClubsQuery {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn clubs(query: &ClubsQuery) -> ApiRequest {
    ApiVersion::V2
        .get(&["clubs"])
        .query("Limit", query.limit)
        .query("Offset", query.offset)
        .query_opt("hasParentClub", query.has_parent_club)
        .query_opt("search", query.search.as_deref())
}

pub fn club(club_code: &str) -> ApiRequest {
    ApiVersion::V2.get(&["clubs", club_code])
}

pub fn club_info(club_code: &str) -> ApiRequest {
    ApiVersion::V2.get(&["clubs", club_code, "info"])
}

/// Filters for [`games`]. Unset filters are not sent.
#[derive(Debug, Clone, Builder)]
pub struct GamesQuery {
    #[builder(into)]
    pub phase_type_code: Option<String>,
    pub round_number: Option<u32>,
    #[builder(into)]
    pub group_name: Option<String>,
    pub group_id: Option<u32>,
    #[builder(into)]
    pub team_code: Option<String>,
    #[builder(default = 20)]
    pub limit: u32,
    #[builder(default)]
    pub offset: u32,
    #[builder(into)]
    pub search: Option<String>,
}

impl Default for GamesQuery {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn games(competition: CompetitionCode, season_code: &str, query: &GamesQuery) -> ApiRequest {
    let competition = competition.to_string();
    ApiVersion::V2
        .get(&["competitions", &competition, "seasons", season_code, "games"])
        .query_opt("phaseTypeCode", query.phase_type_code.as_deref())
        .query_opt("roundNumber", query.round_number)
        .query_opt("groupName", query.group_name.as_deref())
        .query_opt("groupId", query.group_id)
        .query_opt("teamCode", query.team_code.as_deref())
        .query("Limit", query.limit)
        .query("Offset", query.offset)
        .query_opt("search", query.search.as_deref())
}

pub fn game(competition: CompetitionCode, season_code: &str, game_code: u32) -> ApiRequest {
    let competition = competition.to_string();
    let game_code = game_code.to_string();
    ApiVersion::V2.get(&[
        "competitions",
        &competition,
        "seasons",
        season_code,
        "games",
        &game_code,
    ])
}

/// Previous meetings between the two teams of a game.
pub fn game_history(competition: CompetitionCode, season_code: &str, game_code: u32) -> ApiRequest {
    let competition = competition.to_string();
    let game_code = game_code.to_string();
    ApiVersion::V2.get(&[
        "competitions",
        &competition,
        "seasons",
        season_code,
        "games",
        &game_code,
        "history",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(request: &ApiRequest) -> Vec<(&str, &str)> {
        request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn clubs_defaults_send_paging_only() {
        let request = clubs(&ClubsQuery::default());
        assert_eq!(request.path, "v2/clubs");
        assert_eq!(pairs(&request), vec![("Limit", "20"), ("Offset", "0")]);
    }

    #[test]
    fn clubs_search_and_parent_filter() {
        let request = clubs(
            &ClubsQuery::builder()
                .limit(5)
                .has_parent_club(false)
                .search("Madrid")
                .build(),
        );
        assert_eq!(
            pairs(&request),
            vec![
                ("Limit", "5"),
                ("Offset", "0"),
                ("hasParentClub", "false"),
                ("search", "Madrid"),
            ]
        );
    }

    #[test]
    fn club_paths() {
        assert_eq!(club("PAN").path, "v2/clubs/PAN");
        assert_eq!(club_info("PAN").path, "v2/clubs/PAN/info");
    }

    #[test]
    fn games_paths_and_filters() {
        let request = games(
            CompetitionCode::Eurocup,
            "U2024",
            &GamesQuery::builder().team_code("VAL").build(),
        );
        assert_eq!(request.path, "v2/competitions/U/seasons/U2024/games");
        assert_eq!(
            pairs(&request),
            vec![("teamCode", "VAL"), ("Limit", "20"), ("Offset", "0")]
        );
        assert_eq!(
            game_history(CompetitionCode::Euroleague, "E2024", 7).path,
            "v2/competitions/E/seasons/E2024/games/7/history"
        );
    }
}
