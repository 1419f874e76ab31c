//! Errors returned by coordination API calls.

use thiserror::Error;

/// A failed coordination API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Non-2xx response
    #[error("Unexpected response code: {status} ({body})")]
    Status { status: u16, body: String },

    /// TCP connection actively refused
    #[error("dial tcp {address}: connection refused")]
    ConnectionRefused { address: String },

    /// Request did not complete within the client timeout
    #[error("request to {address} timed out")]
    Timeout { address: String },

    /// Any other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if the server answered
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
