//! Euroleague API client.
//!
//! OAuth2 PKCE authentication with persisted tokens, a retrying request
//! executor in async and blocking flavors, and request builders for the
//! v1, v2, v3 and live endpoints.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use euroleague::api::{v3, CompetitionCode};
//! use euroleague::auth::FileTokenStore;
//! use euroleague::config::ClientConfig;
//! use euroleague::EuroleagueClient;
//!
//! # async fn example() -> euroleague::error::Result<()> {
//! let config = ClientConfig::builder().client_id("my-client".to_string()).build();
//! let client = EuroleagueClient::new(config, Arc::new(FileTokenStore::new_default()))?;
//!
//! if !client.is_authenticated()? {
//!     let request = client.begin_authorization(None)?;
//!     println!("Visit {}", request.url);
//!     // ...receive `code` on the redirect, then:
//!     // client.exchange_code(&code, &request.verifier).await?;
//! }
//!
//! let standings = client
//!     .execute(&v3::standings(CompetitionCode::Euroleague, "E2024", 10, v3::StandingsKind::Basic))
//!     .await?;
//! println!("{}", standings.body);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::{BlockingEuroleagueClient, EuroleagueClient};
pub use error::{ApiError, ErrorKind, Result};
