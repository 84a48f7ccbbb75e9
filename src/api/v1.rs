//! Legacy v1 endpoints.

use crate::http::ApiRequest;

use super::ApiVersion;

/// Box score and header data for one game.
pub fn game(season_code: &str, game_code: u32) -> ApiRequest {
    ApiVersion::V1
        .get(&["games"])
        .query("seasonCode", season_code)
        .query("gameCode", game_code)
}

/// Games played in a season, optionally only those after `game_number`.
pub fn results(season_code: &str, game_number: Option<u32>) -> ApiRequest {
    ApiVersion::V1
        .get(&["results"])
        .query("seasonCode", season_code)
        .query_opt("gameNumber", game_number)
}
