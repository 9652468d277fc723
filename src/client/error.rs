//! Client-side errors.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with status >= 400. `body` is the response text.
    #[error("{status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Connection, timeout or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match its content type or the requested type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A `:name` or `...name` segment had no value.
    #[error("missing value for path parameter `{0}`")]
    MissingParam(String),

    #[error("invalid header `{0}`")]
    InvalidHeader(String),
}

impl ClientError {
    /// HTTP status, when the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
