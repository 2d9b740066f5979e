//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// RoomName validation error
    #[error("room name cannot be empty")]
    RoomNameEmpty,

    /// RoomName too long error
    #[error("room name cannot exceed {max} bytes (got {actual})")]
    RoomNameTooLong { max: usize, actual: usize },

    /// RoomName contains whitespace
    #[error("room name cannot contain whitespace (got '{0}')")]
    RoomNameContainsWhitespace(String),
}

/// Errors returned by the room registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),

    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("{member} is not a member of room '{room}'")]
    NotAMember { member: String, room: String },
}
