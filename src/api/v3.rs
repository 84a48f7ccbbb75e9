//! v3 statistics endpoints: standings and player statistics.

use bon::Builder;
use strum::{Display, EnumString};

use crate::http::ApiRequest;

use super::{ApiVersion, CompetitionCode, SeasonMode, SortDirection, StatisticMode};

/// Standings views available per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum StandingsKind {
    #[strum(serialize = "basicstandings")]
    Basic,
    #[strum(serialize = "calendarstandings")]
    Calendar,
    #[strum(serialize = "streaks")]
    Streaks,
    #[strum(serialize = "aheadbehind")]
    AheadBehind,
    #[strum(serialize = "margins")]
    Margins,
}

pub fn standings(
    competition: CompetitionCode,
    season_code: &str,
    round_number: u32,
    kind: StandingsKind,
) -> ApiRequest {
    let competition = competition.to_string();
    let round = round_number.to_string();
    let kind = kind.to_string();
    ApiVersion::V3.get(&[
        "competitions",
        &competition,
        "seasons",
        season_code,
        "rounds",
        &round,
        &kind,
    ])
}

#[derive(Debug, Clone, Builder)]
pub struct PlayerLeadersQuery {
    pub season_mode: Option<SeasonMode>,
    #[builder(into)]
    pub season_code: Option<String>,
    #[builder(into)]
    pub from_season_code: Option<String>,
    #[builder(into)]
    pub to_season_code: Option<String>,
    #[builder(into)]
    pub phase_type_code: Option<String>,
    #[builder(into)]
    pub team_code: Option<String>,
    #[builder(default = 10)]
    pub limit: u32,
}

pub fn player_leaders(competition: CompetitionCode, query: &PlayerLeadersQuery) -> ApiRequest {
    player_stats_path(competition, "leaders")
        .query_opt("SeasonMode", query.season_mode)
        .query_opt("SeasonCode", query.season_code.as_deref())
        .query_opt("FromSeasonCode", query.from_season_code.as_deref())
        .query_opt("ToSeasonCode", query.to_season_code.as_deref())
        .query_opt("phaseTypeCode", query.phase_type_code.as_deref())
        .query_opt("teamCode", query.team_code.as_deref())
        .query("limit", query.limit)
}

#[derive(Debug, Clone, Builder)]
pub struct PlayerStatsQuery {
    pub season_mode: Option<SeasonMode>,
    #[builder(into)]
    pub season_code: Option<String>,
    #[builder(into)]
    pub phase_type_code: Option<String>,
    pub statistic_mode: Option<StatisticMode>,
    /// Statistic to sort by.
    #[builder(into)]
    pub statistic: Option<String>,
    pub sort_direction: Option<SortDirection>,
    #[builder(default)]
    pub offset: u32,
    #[builder(default = 20)]
    pub limit: u32,
}

pub fn player_traditional(competition: CompetitionCode, query: &PlayerStatsQuery) -> ApiRequest {
    player_stats_path(competition, "traditional")
        .query_opt("SeasonMode", query.season_mode)
        .query_opt("SeasonCode", query.season_code.as_deref())
        .query_opt("phaseTypeCode", query.phase_type_code.as_deref())
        .query_opt("statisticMode", query.statistic_mode)
        .query_opt("statistic", query.statistic.as_deref())
        .query_opt("sortDirection", query.sort_direction)
        .query("offset", query.offset)
        .query("limit", query.limit)
}

fn player_stats_path(competition: CompetitionCode, view: &str) -> ApiRequest {
    let competition = competition.to_string();
    ApiVersion::V3.get(&["competitions", &competition, "statistics", "players", view])
}
