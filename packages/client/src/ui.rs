//! UI utilities for the client.

use std::io::Write;

use hiroba_shared::protocol::ServerMessage;

use crate::{formatter::MessageFormatter, session::ClientEvent};

pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

/// Text to print for an event
pub fn render_event(event: &ClientEvent) -> String {
    match event {
        ClientEvent::Connected => {
            format!("Connected to chat server!\n{}", MessageFormatter::format_help())
        }
        ClientEvent::Received(message) => render_message(message),
        ClientEvent::Notice(text) => text.clone(),
        ClientEvent::Help => MessageFormatter::format_help(),
        ClientEvent::ChatModeEntered => MessageFormatter::format_chat_mode_entered(),
        ClientEvent::Disconnected => "disconnected from server".to_string(),
        ClientEvent::Reconnecting {
            attempt,
            max_attempts,
        } => MessageFormatter::format_reconnecting(*attempt, *max_attempts),
        ClientEvent::ReconnectFailed => "reconnect failed, closing client".to_string(),
    }
}

fn render_message(message: &ServerMessage) -> String {
    match message {
        ServerMessage::RoomList(rooms) => MessageFormatter::format_room_list(rooms),
        ServerMessage::JoinedRoom(room) => MessageFormatter::format_joined(room),
        ServerMessage::CreatedRoom(room) => MessageFormatter::format_created(room),
        ServerMessage::LeftRoom => MessageFormatter::format_left(),
        ServerMessage::Chat(chat) => MessageFormatter::format_chat_message(chat),
        ServerMessage::Failure { reason, .. } => MessageFormatter::format_failure(reason),
    }
}
