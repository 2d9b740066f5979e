//! Hiroba wire protocol.
//!
//! Two layers:
//!
//! - [`codec`]: length-prefixed framing over a byte stream
//!   (`u32` big-endian length, then the body).
//! - [`message`]: the typed client requests and server messages encoded in
//!   a frame body as `type`, optional `status`, then a UTF-8 payload.
//!
//! Framing errors are fatal to a connection; body errors
//! ([`ProtocolError`]) only drop the offending frame.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{CodecError, FrameCodec, MAX_FRAME_SIZE};
pub use error::ProtocolError;
pub use message::{
    ChatMessage, MessageType, Request, RoomSummary, ServerMessage, Status, strip_whitespace,
};
