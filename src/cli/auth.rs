//! CLI auth command handlers for login, status, and logout.

use std::io::{self, BufRead, Write};

use chrono::Utc;

use crate::auth::PkceAuthenticator;
use crate::error::{ApiError, Result};
use crate::EuroleagueClient;

/// Handle `euroleague auth login`.
pub async fn handle_login(
    client: &EuroleagueClient,
    scope: Option<&str>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let scopes: Option<Vec<&str>> = scope.map(|s| s.split_whitespace().collect());
    let request = client.begin_authorization(scopes.as_deref())?;

    println!("🔗 Open this URL and sign in:");
    println!("   {}", request.url);
    println!("📋 Paste the URL you were redirected to (or just the code):");
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let code = code_from_callback(&line, &request.state)?;

    let token = client.exchange_code(&code, &request.verifier).await?;
    println!("✅ Login successful!");
    println!("   Expires: {}", token.expires_at().to_rfc3339());
    Ok(())
}

/// Handle `euroleague auth status`.
pub fn handle_status(client: &EuroleagueClient) -> std::result::Result<(), Box<dyn std::error::Error>> {
    match client.token()? {
        None => println!("❌ Not logged in"),
        Some(token) => {
            let state = if !token.is_expired() {
                "✅ valid"
            } else if token.can_refresh() {
                "🔄 expired, will refresh on next request"
            } else {
                "❌ expired, run `euroleague auth login`"
            };
            println!("Token: {state}");
            let remaining = token.expires_at() - Utc::now();
            if remaining.num_seconds() > 0 {
                println!("   Expires in: {}m", remaining.num_minutes());
            }
            if let Some(scope) = &token.scope {
                println!("   Scope: {scope}");
            }
        }
    }
    Ok(())
}

/// Handle `euroleague auth logout`.
pub fn handle_logout(client: &EuroleagueClient) -> std::result::Result<(), Box<dyn std::error::Error>> {
    client.clear_token()?;
    println!("✅ Logged out");
    Ok(())
}

/// Pull the authorization code out of what the user pasted.
///
/// A full redirect URL has its `state` checked against `expected_state`;
/// a bare code is accepted as is.
pub fn code_from_callback(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ApiError::authentication("No authorization code provided"));
    }
    let Ok(url) = url::Url::parse(input) else {
        return Ok(input.to_string());
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_default();
        return Err(ApiError::Authentication(
            format!("Authorization denied: {error} {description}")
                .trim_end()
                .to_string(),
        ));
    }
    let state = param("state")
        .ok_or_else(|| ApiError::authentication("Redirect URL has no state parameter"))?;
    PkceAuthenticator::validate_callback(expected_state, &state)?;
    param("code").ok_or_else(|| ApiError::authentication("Redirect URL has no code parameter"))
}
