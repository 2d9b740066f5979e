//! Value Objects for domain models.

use std::fmt;

use super::error::ValueObjectError;

/// Maximum room name length in bytes
pub const MAX_ROOM_NAME_LENGTH: usize = 64;

/// Opaque identifier of one accepted connection.
///
/// Assigned by the server from a counter; displayed as `user-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

/// Room name value object.
///
/// Non-empty, no whitespace, at most [`MAX_ROOM_NAME_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomName(String);

impl RoomName {
    /// Create a new RoomName.
    ///
    /// # Arguments
    ///
    /// * `name` - The room name, already stripped of whitespace by the codec
    ///
    /// # Returns
    ///
    /// A Result containing the RoomName or an error if validation fails
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ValueObjectError::RoomNameContainsWhitespace(name));
        }
        let len = name.len();
        if len > MAX_ROOM_NAME_LENGTH {
            return Err(ValueObjectError::RoomNameTooLong {
                max: MAX_ROOM_NAME_LENGTH,
                actual: len,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
