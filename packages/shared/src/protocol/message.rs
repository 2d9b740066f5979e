//! Typed messages carried in a frame body.
//!
//! ```text
//! client -> server : type:u8 payload:utf8*
//! server -> client : type:u8 status:u8 payload:utf8*
//! ```
//!
//! Type discriminators are the ASCII digits the user types after `#`
//! (`'1'` list rooms .. `'6'` quit system). Status is `'0'` for success and
//! `'1'` for failure.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use super::error::ProtocolError;

/// Request / response kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    ListRooms,
    JoinRoom,
    QuitRoom,
    CreateRoom,
    Chat,
    QuitSystem,
}

impl MessageType {
    /// Wire discriminator
    pub fn as_byte(self) -> u8 {
        match self {
            Self::ListRooms => b'1',
            Self::JoinRoom => b'2',
            Self::QuitRoom => b'3',
            Self::CreateRoom => b'4',
            Self::Chat => b'5',
            Self::QuitSystem => b'6',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(Self::ListRooms),
            b'2' => Some(Self::JoinRoom),
            b'3' => Some(Self::QuitRoom),
            b'4' => Some(Self::CreateRoom),
            b'5' => Some(Self::Chat),
            b'6' => Some(Self::QuitSystem),
            _ => None,
        }
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Success => b'0',
            Self::Failure => b'1',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Self::Success),
            b'1' => Some(Self::Failure),
            _ => None,
        }
    }
}

/// Read-only projection of a room for the room listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room name
    pub name: String,
    /// Number of members at the time of the listing
    pub user_count: usize,
}

/// Chat message broadcast to every member of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender display id (e.g. "user-7")
    pub user: String,
    /// Chat text
    pub msg: String,
    /// Unix timestamp when the server received the message (milliseconds)
    pub date: i64,
}

/// Client -> server request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListRooms,
    JoinRoom { room: String },
    QuitRoom,
    CreateRoom { room: String },
    Chat { text: String },
    QuitSystem,
}

impl Request {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::ListRooms => MessageType::ListRooms,
            Self::JoinRoom { .. } => MessageType::JoinRoom,
            Self::QuitRoom => MessageType::QuitRoom,
            Self::CreateRoom { .. } => MessageType::CreateRoom,
            Self::Chat { .. } => MessageType::Chat,
            Self::QuitSystem => MessageType::QuitSystem,
        }
    }

    /// Encode into a frame body
    pub fn encode(&self) -> Bytes {
        let payload = match self {
            Self::JoinRoom { room } | Self::CreateRoom { room } => strip_whitespace(room),
            Self::Chat { text } => text.clone(),
            Self::ListRooms | Self::QuitRoom | Self::QuitSystem => String::new(),
        };

        let mut buf = BytesMut::with_capacity(1 + payload.len());
        buf.put_u8(self.message_type().as_byte());
        buf.extend_from_slice(payload.as_bytes());
        buf.freeze()
    }

    /// Decode a frame body received by the server
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let (&type_byte, payload) = body
            .split_first()
            .ok_or_else(|| ProtocolError::malformed("empty request frame"))?;
        let message_type = MessageType::from_byte(type_byte).ok_or_else(|| {
            ProtocolError::malformed(format!("unknown message type 0x{type_byte:02x}"))
        })?;
        let payload = payload_str(payload)?;

        Ok(match message_type {
            MessageType::ListRooms => Self::ListRooms,
            MessageType::JoinRoom => Self::JoinRoom {
                room: strip_whitespace(payload),
            },
            MessageType::QuitRoom => Self::QuitRoom,
            MessageType::CreateRoom => Self::CreateRoom {
                room: strip_whitespace(payload),
            },
            MessageType::Chat => Self::Chat {
                text: payload.to_string(),
            },
            MessageType::QuitSystem => Self::QuitSystem,
        })
    }
}

/// Server -> client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Successful LIST_ROOMS
    RoomList(Vec<RoomSummary>),
    /// Successful JOIN_ROOM, carrying the joined room name
    JoinedRoom(String),
    /// Successful CREATE_ROOM, carrying the created room name
    CreatedRoom(String),
    /// Successful QUIT_ROOM
    LeftRoom,
    /// Chat broadcast
    Chat(ChatMessage),
    /// Any failed request, carrying a human-readable description
    Failure { request: MessageType, reason: String },
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::RoomList(_) => MessageType::ListRooms,
            Self::JoinedRoom(_) => MessageType::JoinRoom,
            Self::CreatedRoom(_) => MessageType::CreateRoom,
            Self::LeftRoom => MessageType::QuitRoom,
            Self::Chat(_) => MessageType::Chat,
            Self::Failure { request, .. } => *request,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Failure { .. } => Status::Failure,
            _ => Status::Success,
        }
    }

    /// Encode into a frame body
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let payload = match self {
            Self::RoomList(rooms) => serde_json::to_string(rooms)?,
            Self::JoinedRoom(room) | Self::CreatedRoom(room) => room.clone(),
            Self::LeftRoom => String::new(),
            Self::Chat(message) => serde_json::to_string(message)?,
            Self::Failure { reason, .. } => reason.clone(),
        };

        let mut buf = BytesMut::with_capacity(2 + payload.len());
        buf.put_u8(self.message_type().as_byte());
        buf.put_u8(self.status().as_byte());
        buf.extend_from_slice(payload.as_bytes());
        Ok(buf.freeze())
    }

    /// Decode a frame body received by the client
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let [type_byte, status_byte, payload @ ..] = body else {
            return Err(ProtocolError::malformed(format!(
                "server frame of {} bytes is shorter than its 2-byte header",
                body.len()
            )));
        };
        let message_type = MessageType::from_byte(*type_byte).ok_or_else(|| {
            ProtocolError::malformed(format!("unknown message type 0x{type_byte:02x}"))
        })?;
        let status = Status::from_byte(*status_byte).ok_or_else(|| {
            ProtocolError::malformed(format!("unknown status 0x{status_byte:02x}"))
        })?;
        let payload = payload_str(payload)?;

        Ok(match (message_type, status) {
            (MessageType::QuitSystem, _) => {
                return Err(ProtocolError::malformed(
                    "QUIT_SYSTEM is never sent by the server",
                ));
            }
            (request, Status::Failure) => Self::Failure {
                request,
                reason: payload.to_string(),
            },
            (MessageType::ListRooms, Status::Success) => {
                Self::RoomList(serde_json::from_str(payload)?)
            }
            (MessageType::JoinRoom, Status::Success) => Self::JoinedRoom(payload.to_string()),
            (MessageType::CreateRoom, Status::Success) => Self::CreatedRoom(payload.to_string()),
            (MessageType::QuitRoom, Status::Success) => Self::LeftRoom,
            (MessageType::Chat, Status::Success) => Self::Chat(serde_json::from_str(payload)?),
        })
    }
}

/// Remove every whitespace character from a room name argument
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn payload_str(payload: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(payload)
        .map_err(|e| ProtocolError::malformed(format!("payload is not valid UTF-8: {e}")))
}
