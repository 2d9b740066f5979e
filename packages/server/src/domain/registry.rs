//! Room Registry trait 定義
//!
//! サーバー内で唯一の、ルーム名 → メンバー集合の権威ある保管場所の
//! インターフェース。具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use bytes::Bytes;

use hiroba_shared::protocol::RoomSummary;

use super::{ConnectionId, Member, RegistryError, RoomName};

/// Room Registry trait
///
/// `create_room` / `join_room` / `leave_room` are check-and-act sequences and
/// must be mutually exclusive with each other across all room names.
/// `list_rooms` and the membership read inside `broadcast` are allowed to
/// observe a slightly stale mapping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Snapshot of every room and its member count, sorted by name
    async fn list_rooms(&self) -> Vec<RoomSummary>;

    /// Create `name` with `member` as its only member
    async fn create_room(&self, name: RoomName, member: Member) -> Result<(), RegistryError>;

    /// Add `member` to an existing room.
    ///
    /// Does not check whether the member already belongs to another room;
    /// the session enforces that.
    async fn join_room(&self, member: Member, name: &RoomName) -> Result<(), RegistryError>;

    /// Remove `member` from `name`, deleting the room if it becomes empty
    async fn leave_room(
        &self,
        member: ConnectionId,
        name: &RoomName,
    ) -> Result<(), RegistryError>;

    /// Queue `frame` on every current member of `name`.
    ///
    /// Per-member send failures are logged and skipped. Returns the number of
    /// members the frame was queued for.
    async fn broadcast(&self, name: &RoomName, frame: Bytes) -> Result<usize, RegistryError>;
}
