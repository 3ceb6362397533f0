//! Retry message formatting for the request layer.
//!
//! Requests are retried without limit, so every retry is logged with a
//! classification of what went wrong and how long the caller will wait.

use reqwest::{Error as ReqwestError, StatusCode};
use std::time::Duration;

/// Classification of retry causes for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Network timeout or connection stalled long enough to trigger a timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// Rate limit response (403/429 with quota headers)
    RateLimit,
    /// HTTP 5xx server error
    ServerError(u16),
    /// Unexpected 4xx response other than 404
    ClientError(u16),
    /// Body could not be read or decoded
    MalformedBody,
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// User-friendly description string used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(code) => match code {
                401 => "authentication failed (401)",
                403 => "forbidden (403)",
                422 => "query rejected (422)",
                _ => "client error",
            },
            Self::MalformedBody => "malformed response body",
            Self::NetworkGeneric => "network error",
        }
    }
}

/// Extract a [`RetryErrorType`] from an HTTP status or reqwest error.
pub fn extract_error_type(status: Option<StatusCode>, err: Option<&ReqwestError>) -> RetryErrorType {
    if let Some(status) = status {
        if status.as_u16() == 429 {
            return RetryErrorType::RateLimit;
        }

        if status.is_server_error() {
            return RetryErrorType::ServerError(status.as_u16());
        }

        if status.is_client_error() {
            return RetryErrorType::ClientError(status.as_u16());
        }
    }

    if let Some(err) = err {
        if err.is_timeout() {
            return RetryErrorType::NetworkTimeout;
        }

        if err.is_connect() {
            return RetryErrorType::NetworkOffline;
        }

        if err.is_decode() || err.is_body() {
            return RetryErrorType::MalformedBody;
        }
    }

    RetryErrorType::NetworkGeneric
}

/// Format a retry message with the attempt counter and wait.
pub fn format_retry(endpoint: &str, attempt: u64, error_type: RetryErrorType, wait: Duration) -> String {
    format!(
        "Retrying {endpoint} (attempt {}) after {} - waiting {:.1} seconds...",
        attempt + 1,
        error_type.description(),
        wait.as_secs_f64()
    )
}
