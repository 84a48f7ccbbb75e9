//! Real-time game feed.

use crate::http::ApiRequest;

use super::ApiVersion;

pub fn play_by_play(season_code: &str, game_code: u32) -> ApiRequest {
    live_request("PlayByPlay", season_code, game_code)
}

/// Shot locations with court coordinates.
pub fn shots(season_code: &str, game_code: u32) -> ApiRequest {
    live_request("Points", season_code, game_code)
}

fn live_request(feed: &str, season_code: &str, game_code: u32) -> ApiRequest {
    ApiVersion::Live
        .get(&[feed])
        .query("seasoncode", season_code)
        .query("gamecode", game_code)
}
