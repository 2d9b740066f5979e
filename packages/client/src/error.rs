//! Error types for the chat client.

use thiserror::Error;

use hiroba_shared::protocol::CodecError;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Command line that does not parse
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Chat or quit-room with no mirrored room
    #[error("you are not in a chat room")]
    NotInRoom,

    /// Join or create while a room is mirrored
    #[error("you are already in room '{0}'")]
    AlreadyInRoom(String),

    #[error("failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
