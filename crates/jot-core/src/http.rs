//! Shared HTTP plumbing for the backend clients.
//!
//! Every call site maps transport and backend failures into the crate's
//! error kinds here, so implementation-specific error shapes never leak.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Header carrying the project identifier on every request.
pub const PROJECT_HEADER: &str = "X-Appwrite-Project";
/// Header carrying the session secret on authenticated requests.
pub const SESSION_HEADER: &str = "X-Appwrite-Session";

/// Build a client with the configured per-request deadline.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| Error::Config(format!("failed to construct HTTP client: {error}")))
}

/// Map a request-level failure (connect, body, deadline) onto an error kind.
pub fn request_error(error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error.to_string())
    } else {
        Error::Transport(error.to_string())
    }
}

/// Map a non-success response status onto an error kind.
pub fn status_error(status: StatusCode, body: &str) -> Error {
    let message = parse_api_error(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => Error::Validation(message),
        _ => Error::Transport(message),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Extract a readable message from a backend error payload.
pub fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error_type) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

/// Truncate text to at most 180 characters for error messages.
fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_api_error_prefers_backend_message() {
        let body = r#"{"message":"Invalid credentials","code":401,"type":"user_invalid_credentials"}"#;
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, body),
            "Invalid credentials (401)"
        );
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (502)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn status_error_maps_onto_error_kinds() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            Error::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            Error::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, ""),
            Error::Validation(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, ""),
            Error::Transport(_)
        ));
    }
}
