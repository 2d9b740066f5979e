//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、サーバー再起動で全て消えます。
//!
//! ## ロック方針
//!
//! 1 つの `RwLock` で全ルームを守ります。create / join / leave は
//! 書き込みロックの中で確認と更新を行うため、同名ルームの同時作成が
//! 両方成功することはありません。list / broadcast は読み込みロックのみで、
//! 直前・直後の変更を反映しているかどうかは保証しません。

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use hiroba_shared::protocol::RoomSummary;

use crate::domain::{ConnectionId, Member, RegistryError, Room, RoomName, RoomRegistry};

/// インメモリ Room Registry 実装
#[derive(Debug, Default)]
pub struct InMemoryRoomRegistry {
    /// ルーム名 → ルーム（常に 1 人以上のメンバーを持つ）
    rooms: RwLock<HashMap<RoomName, Room>>,
}

impl InMemoryRoomRegistry {
    /// 新しい空の InMemoryRoomRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.read().await;
        let mut summaries: Vec<RoomSummary> = rooms.values().map(Room::summary).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    async fn create_room(&self, name: RoomName, member: Member) -> Result<(), RegistryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&name) {
            return Err(RegistryError::RoomAlreadyExists(name.into_string()));
        }

        tracing::info!("{} created room '{}'", member.id, name);
        rooms.insert(name.clone(), Room::with_creator(name, member));
        Ok(())
    }

    async fn join_room(&self, member: Member, name: &RoomName) -> Result<(), RegistryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(name)
            .ok_or_else(|| RegistryError::RoomNotFound(name.as_str().to_string()))?;

        tracing::info!("{} joined room '{}'", member.id, name);
        room.add_member(member);
        Ok(())
    }

    async fn leave_room(
        &self,
        member: ConnectionId,
        name: &RoomName,
    ) -> Result<(), RegistryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(name)
            .ok_or_else(|| RegistryError::RoomNotFound(name.as_str().to_string()))?;

        if !room.remove_member(&member) {
            return Err(RegistryError::NotAMember {
                member: member.to_string(),
                room: name.as_str().to_string(),
            });
        }
        tracing::info!("{} left room '{}'", member, name);

        if room.is_empty() {
            rooms.remove(name);
            tracing::info!("Room '{}' is empty and has been removed", name);
        }
        Ok(())
    }

    async fn broadcast(&self, name: &RoomName, frame: Bytes) -> Result<usize, RegistryError> {
        let rooms = self.rooms.read().await;
        let room = rooms
            .get(name)
            .ok_or_else(|| RegistryError::RoomNotFound(name.as_str().to_string()))?;

        let mut delivered = 0;
        for (id, channel) in room.members() {
            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = channel.send(frame.clone()) {
                tracing::warn!("Failed to queue broadcast for {}: {}", id, e);
            } else {
                delivered += 1;
            }
        }
        tracing::debug!(
            "Broadcasted to {}/{} members of '{}'",
            delivered,
            room.member_count(),
            name
        );

        Ok(delivered)
    }
}
