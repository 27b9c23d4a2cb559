//! Error types for the transport client.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by OpenAI-compatible backends.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// Errors that can occur while talking to the chat backend.
///
/// Every variant is a transport failure from the engine's point of view: the
/// exchange is aborted and the transcript is left as it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Error raised by a request middleware (retry layer).
    #[error("Middleware error: {0}")]
    MiddlewareError(anyhow::Error),

    /// The request or response body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP 401.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP 429.
    #[error("Rate limit exceeded: {retry_after:?}")]
    RateLimitError {
        /// Suggested wait time before retrying, if the backend sent one.
        retry_after: Option<Duration>,
    },

    /// HTTP 5xx.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other non-success status.
    #[error("Request failed with status {status}: {message}")]
    RequestError { status: u16, message: String },

    /// The client is misconfigured (missing or invalid base URL).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request timed out, either in the HTTP layer or at the caller.
    #[error("Timeout error")]
    TimeoutError,

    /// The request is structurally invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backend answered 2xx with a body that is not a usable chat response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Check if this error is potentially retryable.
    ///
    /// Returns `true` for network errors, timeouts, rate limits, and service unavailable errors.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::MiddlewareError(_)
                | Self::TimeoutError
                | Self::RateLimitError { .. }
                | Self::ServiceUnavailable(_)
        )
    }

    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }

    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitError { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest_middleware::Error> for ClientError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => Self::TimeoutError,
            reqwest_middleware::Error::Reqwest(e) => Self::NetworkError(e),
            reqwest_middleware::Error::Middleware(e) => Self::MiddlewareError(e),
        }
    }
}
