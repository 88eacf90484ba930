//! Classification of HTTP error statuses into user-facing API errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Error statuses returned by the forge, worded for the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "Rate limit exceeded: {0}. Try again later or set GITHUB_TOKEN environment variable."
    )]
    RateLimitExceeded(String),

    #[error("Authentication failed: {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// GitHub also answers 403 when anonymous callers are rate limited.
    #[error("Access forbidden: {0}. You may be rate limited or need authentication.")]
    Forbidden(String),

    #[error("Request error: {0}")]
    ClientError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

/// Map an error status to an [`ApiError`]. Returns `None` for transport errors
/// that carry no status.
pub fn classify_status(status: StatusCode) -> Option<ApiError> {
    let error = match status {
        StatusCode::UNAUTHORIZED => {
            ApiError::AuthenticationFailed("Invalid or missing authentication token".to_string())
        }
        StatusCode::FORBIDDEN => {
            ApiError::Forbidden("Access to this resource is forbidden".to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            ApiError::RateLimitExceeded("Too many requests".to_string())
        }
        StatusCode::NOT_FOUND => {
            ApiError::NotFound("The requested resource was not found".to_string())
        }
        s if s.is_client_error() => ApiError::ClientError(format!("HTTP {} error", s.as_u16())),
        s if s.is_server_error() => ApiError::ServerError(format!("HTTP {} error", s.as_u16())),
        _ => return None,
    };
    Some(error)
}

/// Converts an error from `error_for_status()` into an `anyhow::Error`,
/// replacing known statuses with an [`ApiError`].
pub fn check_status(error: reqwest::Error) -> anyhow::Error {
    match error.status().and_then(classify_status) {
        Some(api_error) => anyhow::Error::from(api_error),
        None => anyhow::Error::from(error),
    }
}
