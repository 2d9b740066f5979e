//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use hiroba_shared::protocol::{MAX_FRAME_SIZE, Request};

use crate::{
    command::{Command, EXIT_CHAT_COMMAND, parse_command},
    error::ClientError,
    state::{Mirror, Mode},
};

/// What the command loop should do with one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do (blank line)
    Ignore,
    /// Write this request to the server
    Send(Request),
    /// Switch to chat mode
    EnterChat,
    /// Switch back to command mode
    ExitChat,
    /// Send QUIT_SYSTEM and stop
    Quit,
}

/// Check whether an error means the connection itself is unusable.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` for I/O and framing failures, `false` for errors that only
/// concern one input line
pub fn is_connection_failure(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::ConnectionError(_) | ClientError::Codec(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The number of reconnection attempts made so far
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Only a broken connection is worth reconnecting for
    if !is_connection_failure(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Decide what to do with one input line given the mirrored state.
///
/// Room preconditions are checked against the mirror only; the server stays
/// the authority and may still reject the request.
///
/// In chat mode the line is sent exactly as typed, surrounding whitespace
/// included. In command mode it is trimmed first and a blank line is ignored.
///
/// # Errors
///
/// Returns [`ClientError::InvalidCommand`] for unparsable command lines,
/// [`ClientError::NotInRoom`] for quit-room or chat without a room and
/// [`ClientError::AlreadyInRoom`] for join or create while in a room.
pub fn plan_line(mirror: &Mirror, line: &str) -> Result<Action, ClientError> {
    if line.is_empty() {
        return Ok(Action::Ignore);
    }

    if mirror.mode == Mode::Chatting {
        if line == EXIT_CHAT_COMMAND {
            return Ok(Action::ExitChat);
        }
        // One byte of the frame is the type discriminator
        if line.len() >= MAX_FRAME_SIZE {
            return Err(ClientError::InvalidCommand(
                "chat message is too long".to_string(),
            ));
        }
        return Ok(Action::Send(Request::Chat {
            text: line.to_string(),
        }));
    }

    let line = line.trim();
    if line.is_empty() {
        return Ok(Action::Ignore);
    }

    match parse_command(line)? {
        Command::ListRooms => Ok(Action::Send(Request::ListRooms)),
        Command::JoinRoom(room) => {
            ensure_no_room(mirror)?;
            Ok(Action::Send(Request::JoinRoom { room }))
        }
        Command::CreateRoom(room) => {
            ensure_no_room(mirror)?;
            Ok(Action::Send(Request::CreateRoom { room }))
        }
        Command::QuitRoom => {
            ensure_room(mirror)?;
            Ok(Action::Send(Request::QuitRoom))
        }
        Command::EnterChat => {
            ensure_room(mirror)?;
            Ok(Action::EnterChat)
        }
        Command::QuitSystem => Ok(Action::Quit),
    }
}

fn ensure_room(mirror: &Mirror) -> Result<(), ClientError> {
    match mirror.room {
        Some(_) => Ok(()),
        None => Err(ClientError::NotInRoom),
    }
}

fn ensure_no_room(mirror: &Mirror) -> Result<(), ClientError> {
    match &mirror.room {
        Some(room) => Err(ClientError::AlreadyInRoom(room.clone())),
        None => Ok(()),
    }
}
