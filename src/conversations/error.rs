//! Error type for the Conversations API client.
//!
//! Every remote call returns [`ApiError`] on failure; the reconciler decides
//! per call site whether the error is fatal, recovered or recorded.

use thiserror::Error;

/// Errors that can occur while talking to the Conversations API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform answered with HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other 4xx/5xx. `code` is the platform error code when the body carried one.
    #[error("API error (status {status}{}): {message}", code_suffix(.code))]
    Status {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Underlying transport failure (DNS, connection refused, TLS).
    #[error("network error: {0}")]
    Network(reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display() {
        let err = ApiError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "rate limited, retry after 5000ms");
    }

    #[test]
    fn status_display_with_code() {
        let err = ApiError::Status {
            status: 409,
            code: Some(50353),
            message: "Conversation state transition is not allowed".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 409, code 50353): Conversation state transition is not allowed"
        );
    }

    #[test]
    fn status_display_without_code() {
        let err = ApiError::Status {
            status: 500,
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
