//! Error types for the API client

use thiserror::Error;

/// API client error
///
/// Every failure a caller can observe is one of these variants; raw
/// transport errors never escape the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not reach the server (DNS, refused connection, dropped socket)
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Server answered with a non-success status other than 401
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Credentials missing, invalid, or expired (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Success status but the body was not the expected JSON
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Anything that fits no other bucket
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    /// Classify a transport-level failure into the client taxonomy.
    ///
    /// Decode failures are `Malformed` because reqwest only reports them
    /// after a success status was already seen.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ApiError::Unreachable(err.to_string())
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Unknown(err.to_string())
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// True for failures where the server was never heard from,
    /// so the session must not be torn down over them.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Unreachable(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Malformed(e.to_string())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
