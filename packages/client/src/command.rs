//! Parsing of command-mode input lines.
//!
//! A command line is `#` followed by one digit and optional arguments,
//! e.g. `#1` or `#2 lobby`.

use hiroba_shared::protocol::{MessageType, strip_whitespace};

use crate::error::ClientError;

/// Longest accepted command line, in characters
pub const MAX_COMMAND_LENGTH: usize = 1000;

/// Line that leaves chat mode
pub const EXIT_CHAT_COMMAND: &str = "#exit";

/// A parsed command-mode line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `#1`
    ListRooms,
    /// `#2 <room>`
    JoinRoom(String),
    /// `#3`
    QuitRoom,
    /// `#4 <room>`
    CreateRoom(String),
    /// `#5`
    EnterChat,
    /// `#6`
    QuitSystem,
}

/// Parse one command-mode line.
///
/// Room names have all whitespace removed; a join or create that is left
/// without a name is invalid.
///
/// # Errors
///
/// Returns [`ClientError::InvalidCommand`] for lines of the wrong length,
/// without the `#` prefix, or with an unknown command digit.
pub fn parse_command(line: &str) -> Result<Command, ClientError> {
    let length = line.chars().count();
    if !(2..=MAX_COMMAND_LENGTH).contains(&length) {
        return Err(ClientError::InvalidCommand(format!(
            "commands are 2 to {MAX_COMMAND_LENGTH} characters long"
        )));
    }

    let bytes = line.as_bytes();
    if bytes[0] != b'#' {
        return Err(ClientError::InvalidCommand(
            "commands start with '#'".to_string(),
        ));
    }

    let message_type = MessageType::from_byte(bytes[1])
        .ok_or_else(|| ClientError::InvalidCommand(format!("unknown command '{line}'")))?;
    // The command digit is ASCII, so byte offset 2 is a char boundary.
    let args = &line[2..];

    match message_type {
        MessageType::ListRooms => Ok(Command::ListRooms),
        MessageType::JoinRoom => room_argument(args).map(Command::JoinRoom),
        MessageType::QuitRoom => Ok(Command::QuitRoom),
        MessageType::CreateRoom => room_argument(args).map(Command::CreateRoom),
        MessageType::Chat => Ok(Command::EnterChat),
        MessageType::QuitSystem => Ok(Command::QuitSystem),
    }
}

fn room_argument(args: &str) -> Result<String, ClientError> {
    let room = strip_whitespace(args);
    if room.is_empty() {
        return Err(ClientError::InvalidCommand(
            "a room name is required".to_string(),
        ));
    }
    Ok(room)
}
