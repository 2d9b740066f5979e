//! Server state shared by the listener and every session.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use tokio_util::{sync::CancellationToken, task::TaskTracker};

use hiroba_shared::time::{Clock, SystemClock};

use crate::{
    domain::{ConnectionId, RoomRegistry},
    infrastructure::InMemoryRoomRegistry,
};

/// Process-scoped server context
///
/// Passed explicitly to the listener and to each session; there is no
/// global state. Cancelling [`ServerContext::shutdown`] asks every session
/// to close.
pub struct ServerContext {
    /// Registry（ルーム管理の抽象化）
    pub registry: Arc<dyn RoomRegistry>,
    /// Clock used to stamp chat messages
    pub clock: Arc<dyn Clock>,
    /// Cancelled when the server shuts down
    pub shutdown: CancellationToken,
    /// Tracks spawned session tasks so shutdown can wait for them
    pub tasks: TaskTracker,
    live_connections: AtomicUsize,
    next_connection_id: AtomicU64,
}

impl ServerContext {
    pub fn new(registry: Arc<dyn RoomRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            clock,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
            live_connections: AtomicUsize::new(0),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Context with an empty in-memory registry and the system clock
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRoomRegistry::new()), Arc::new(SystemClock))
    }

    /// Allocate the id of a newly accepted connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Record an accepted connection; returns the new live count
    pub fn connection_opened(&self) -> usize {
        self.live_connections.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a closed connection; returns the new live count
    pub fn connection_closed(&self) -> usize {
        self.live_connections.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub fn live_connections(&self) -> usize {
        self.live_connections.load(Ordering::SeqCst)
    }
}
