//! Client-side mirror of server-confirmed state.
//!
//! Shared between the command loop and the background reader. The mirror is
//! only ever updated from server acknowledgments, never ahead of them.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, Notify};

use hiroba_shared::protocol::ServerMessage;

/// Input mode of the command loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Lines are `#<digit>` commands
    #[default]
    Command,
    /// Lines are sent as chat text
    Chatting,
}

/// Snapshot of the mirrored room and mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mirror {
    pub room: Option<String>,
    pub mode: Mode,
}

/// Mirror state plus connection liveness
#[derive(Debug, Default)]
pub struct MirrorState {
    mirror: Mutex<Mirror>,
    alive: AtomicBool,
    disconnected: Notify,
}

impl MirrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Mirror {
        self.mirror.lock().await.clone()
    }

    /// Update the mirror from a server message.
    ///
    /// Failure responses and chat broadcasts leave it untouched.
    pub async fn apply(&self, message: &ServerMessage) {
        let mut mirror = self.mirror.lock().await;
        match message {
            ServerMessage::JoinedRoom(room) | ServerMessage::CreatedRoom(room) => {
                mirror.room = Some(room.clone());
            }
            ServerMessage::LeftRoom => {
                mirror.room = None;
                mirror.mode = Mode::Command;
            }
            _ => {}
        }
    }

    pub async fn set_mode(&self, mode: Mode) {
        self.mirror.lock().await.mode = mode;
    }

    /// Forget the room and mode; a new connection starts with neither
    pub async fn reset(&self) {
        *self.mirror.lock().await = Mirror::default();
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }

    /// Mark the connection dead, waking [`MirrorState::wait_disconnected`]
    /// if it was alive.
    pub fn mark_dead(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.disconnected.notify_one();
        }
    }

    /// Resolves after the connection has been marked dead.
    ///
    /// May also resolve for a disconnect that has since been recovered, so
    /// callers re-check [`MirrorState::is_alive`].
    pub async fn wait_disconnected(&self) {
        self.disconnected.notified().await;
    }
}
