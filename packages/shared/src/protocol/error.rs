//! Errors raised while interpreting a frame body.

use thiserror::Error;

/// A frame arrived intact but its body could not be interpreted.
///
/// The frame is dropped; the connection stays usable.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Header missing or unknown, or payload not valid UTF-8
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// JSON payload (room list or chat message) could not be parsed
    #[error("malformed message: invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage(reason.into())
    }
}
