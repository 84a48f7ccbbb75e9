//! Endpoint facade: builds [`ApiRequest`]s for the four API generations.
//!
//! Builders only translate parameters into paths and query strings; run
//! the result with either client's `execute`. Responses are raw JSON.
//!
//! ```
//! use euroleague::api::{v2, CompetitionCode};
//!
//! let request = v2::games(
//!     CompetitionCode::Euroleague,
//!     "E2024",
//!     &v2::GamesQuery::builder().round_number(3).build(),
//! );
//! assert_eq!(request.path, "v2/competitions/E/seasons/E2024/games");
//! ```

use strum::{AsRefStr, Display, EnumString};

use crate::http::ApiRequest;

pub mod live;
pub mod v1;
pub mod v2;
pub mod v3;

/// API generation. Each one lives under its own path prefix, except the
/// live feed which sits at the root of the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
    V3,
    Live,
}

impl ApiVersion {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
            Self::Live => "",
        }
    }

    /// Join `segments` under this version's prefix, dropping empty parts.
    pub fn path(self, segments: &[&str]) -> String {
        std::iter::once(self.prefix())
            .chain(segments.iter().copied())
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub(crate) fn get(self, segments: &[&str]) -> ApiRequest {
        ApiRequest::get(self.path(segments))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum CompetitionCode {
    #[strum(serialize = "E")]
    Euroleague,
    #[strum(serialize = "U")]
    Eurocup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SeasonMode {
    Single,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum StatisticMode {
    PerGame,
    Accumulated,
    Per40,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortDirection {
    Ascending,
    Descending,
}
