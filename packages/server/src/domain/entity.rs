//! Core domain models for the chat server.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;

use hiroba_shared::protocol::RoomSummary;

use super::value_object::{ConnectionId, RoomName};

/// Outbound queue of one session. Every frame body pushed here is written
/// to that session's socket in order.
pub type PusherChannel = mpsc::UnboundedSender<Bytes>;

/// A member reference held by the registry
#[derive(Debug, Clone)]
pub struct Member {
    /// Connection identifier
    pub id: ConnectionId,
    /// Outbound queue of the member's session
    pub channel: PusherChannel,
}

impl Member {
    pub fn new(id: ConnectionId, channel: PusherChannel) -> Self {
        Self { id, channel }
    }
}

/// A chat room and its current members.
///
/// A room held by the registry always has at least one member.
#[derive(Debug)]
pub struct Room {
    /// Room name
    pub name: RoomName,
    members: HashMap<ConnectionId, PusherChannel>,
}

impl Room {
    /// Create a room whose first member is its creator
    pub fn with_creator(name: RoomName, creator: Member) -> Self {
        let mut members = HashMap::new();
        members.insert(creator.id, creator.channel);
        Self { name, members }
    }

    /// Add a member, replacing its channel if already present
    pub fn add_member(&mut self, member: Member) {
        self.members.insert(member.id, member.channel);
    }

    /// Remove a member. Returns `false` if it was not a member.
    pub fn remove_member(&mut self, id: &ConnectionId) -> bool {
        self.members.remove(id).is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains_key(id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over members and their outbound queues
    pub fn members(&self) -> impl Iterator<Item = (&ConnectionId, &PusherChannel)> {
        self.members.iter()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.as_str().to_string(),
            user_count: self.members.len(),
        }
    }
}
