//! CLI entry point for the Euroleague client.

pub mod auth;

use clap::{Parser, Subcommand};

/// Euroleague API CLI
#[derive(Parser, Debug)]
#[command(name = "euroleague", version, about = "Euroleague API client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// GET an API path and print the JSON response
    Get(GetArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Run the browser authorization flow and store the token
    Login(LoginArgs),
    /// Show the stored token's state
    Status,
    /// Delete the stored token
    Logout,
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Space-separated scopes to request instead of the configured default
    #[arg(long)]
    pub scope: Option<String>,
}

/// Arguments for `euroleague get`.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// API path relative to the base URL, e.g. v2/clubs
    pub path: String,

    /// Query parameter (repeatable)
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Give up after this many seconds, retries included
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
