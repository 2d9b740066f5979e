//! Errors a session reports back to its client as failure responses.

use thiserror::Error;

use hiroba_shared::protocol::ProtocolError;

use crate::domain::{RegistryError, ValueObjectError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Chat or leave attempted with no current room
    #[error("you are not in a chat room")]
    NotInRoom,

    /// Join or create attempted while already holding a room
    #[error("you are already in room '{0}'")]
    AlreadyInRoom(String),

    /// Encoded chat broadcast would not fit in one frame
    #[error("chat message is too long ({size} bytes encoded, max {max})")]
    MessageTooLong { size: usize, max: usize },

    /// Encoded response would not fit in one frame
    #[error("response is too large to send ({size} bytes encoded, max {max})")]
    ResponseTooLarge { size: usize, max: usize },

    /// A server message could not be encoded
    #[error("failed to encode message: {0}")]
    Encoding(String),

    #[error("invalid room name: {0}")]
    InvalidRoomName(#[from] ValueObjectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<ProtocolError> for SessionError {
    fn from(error: ProtocolError) -> Self {
        Self::Encoding(error.to_string())
    }
}
