//! Error types shared by the HTTP-backed remote service clients.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ApiError`] failures.
pub type ApiResult<T> = Result<T, ApiError>;

/// Transport-level failures while talking to a remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or no response arrived.
    #[error("failed to send `{action}` request to `{url}`")]
    RequestSend {
        /// Room or content action being sent.
        action: String,
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status code.
    #[error("unexpected response status {status} for `{action}`")]
    RequestStatus {
        /// Action that was refused.
        action: String,
        /// Status the service answered with.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected JSON shape.
    #[error("failed to decode `{action}` response")]
    DecodeResponse {
        /// Action whose response failed to decode.
        action: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// The service is unreachable for a reason other than HTTP (local stand-ins).
    #[error("`{action}` unavailable: {message}")]
    Unavailable {
        /// Action that could not be served.
        action: String,
        /// Reason reported by the stand-in.
        message: String,
    },
    /// A response could not be encoded. Retrying produces the same failure.
    #[error("failed to encode `{action}` response")]
    Encode {
        /// Action whose response failed to encode.
        action: String,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether the same request may succeed when sent again.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ApiError::ClientBuilder { .. } | ApiError::Encode { .. })
    }
}
