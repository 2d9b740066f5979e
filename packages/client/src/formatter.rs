//! Message formatting utilities for client display.

use hiroba_shared::{
    protocol::{ChatMessage, RoomSummary},
    time::timestamp_to_local_display,
};

const RULE: &str = "------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the command menu
    pub fn format_help() -> String {
        [
            RULE,
            "#1          list chat rooms",
            "#2 <room>   join a chat room",
            "#3          quit the current chat room",
            "#4 <room>   create a chat room",
            "#5          start chatting (input '#exit' to stop)",
            "#6          quit",
            RULE,
        ]
        .join("\n")
    }

    /// Format the room listing
    ///
    /// # Arguments
    ///
    /// * `rooms` - Rooms as reported by the server
    ///
    /// # Returns
    ///
    /// A table with one row per room, or `no chat room` when empty
    pub fn format_room_list(rooms: &[RoomSummary]) -> String {
        if rooms.is_empty() {
            return "no chat room".to_string();
        }

        let mut output = String::new();
        output.push_str(RULE);
        output.push('\n');
        for room in rooms {
            output.push_str(&format!(
                "Room Name: {:<20} User count: {}\n",
                room.name, room.user_count
            ));
        }
        output.push_str(RULE);
        output
    }

    /// Format a chat broadcast as `user: msg    <local time>`
    pub fn format_chat_message(message: &ChatMessage) -> String {
        format!(
            "{}: {}    {}",
            message.user,
            message.msg,
            timestamp_to_local_display(message.date)
        )
    }

    pub fn format_joined(room: &str) -> String {
        format!("joined chat room {} successfully", room)
    }

    pub fn format_created(room: &str) -> String {
        format!("created chat room {} successfully", room)
    }

    pub fn format_left() -> String {
        "quit chat room successfully".to_string()
    }

    /// Format a failure response from the server
    pub fn format_failure(reason: &str) -> String {
        format!("request failed: {}", reason)
    }

    pub fn format_chat_mode_entered() -> String {
        "You are in chatting mode, input '#exit' to quit chatting mode".to_string()
    }

    pub fn format_reconnecting(attempt: u32, max_attempts: u32) -> String {
        format!("reconnecting... ({}/{})", attempt, max_attempts)
    }
}
