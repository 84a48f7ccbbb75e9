//! Map HTTP responses onto success or a typed [`ApiError`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

use super::transport::TransportResponse;

/// A successful response with its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub status: u16,
    pub body: Value,
}

/// Classify a raw response. 2xx parses the body; everything else becomes
/// the matching error variant.
pub fn classify(response: &TransportResponse) -> Result<ParsedResponse> {
    if (200..300).contains(&response.status) {
        return Ok(ParsedResponse {
            status: response.status,
            body: parse_success_body(&response.body)?,
        });
    }
    Err(status_to_error(response))
}

/// Empty bodies read as `{}`; anything else must be valid JSON.
fn parse_success_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|err| {
        let preview: String = String::from_utf8_lossy(body).chars().take(200).collect();
        ApiError::InvalidResponse(format!("Invalid JSON response ({err}): {preview}"))
    })
}

pub fn status_to_error(response: &TransportResponse) -> ApiError {
    let status = response.status;
    let body: Value = serde_json::from_slice(&response.body).unwrap_or(Value::Null);
    let message = error_message(&body, &response.body);

    match status {
        400 => ApiError::Client {
            status,
            message,
            details: body.get("details").cloned(),
        },
        401 => ApiError::Authentication(message),
        403 => ApiError::Authorization(message),
        404 => ApiError::NotFound {
            resource: string_field(&body, "resource").unwrap_or_else(|| "Resource".to_string()),
            identifier: string_field(&body, "identifier").unwrap_or_else(|| "unknown".to_string()),
        },
        429 => ApiError::RateLimited {
            retry_after: parse_retry_after(response.header("retry-after"), Utc::now()),
        },
        500..=599 => ApiError::Server {
            status,
            message,
            request_id: response.header("x-request-id").map(str::to_string),
        },
        _ => ApiError::Client {
            status,
            message,
            details: None,
        },
    }
}

/// `Retry-After` as delta-seconds or an HTTP-date.
pub fn parse_retry_after(value: Option<&str>, now: DateTime<Utc>) -> Option<Duration> {
    let value = value?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn error_message(body: &Value, raw: &[u8]) -> String {
    if let Some(message) = string_field(body, "message").or_else(|| string_field(body, "error")) {
        return message;
    }
    if body.is_null() {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if !text.is_empty() {
            return text.chars().take(200).collect();
        }
    }
    "Unknown error".to_string()
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
