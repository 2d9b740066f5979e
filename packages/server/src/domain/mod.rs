//! Domain layer: value objects, the room entity and the registry seam.
//!
//! Nothing here performs I/O. Members are represented by their
//! [`ConnectionId`] plus the outbound channel of their session, so the
//! registry can broadcast without knowing about sockets.

pub mod entity;
pub mod error;
pub mod registry;
pub mod value_object;

pub use entity::{Member, PusherChannel, Room};
pub use error::{RegistryError, ValueObjectError};
pub use registry::RoomRegistry;
pub use value_object::{ConnectionId, RoomName};

#[cfg(test)]
pub use registry::MockRoomRegistry;
