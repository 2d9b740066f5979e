//! Per-connection session.
//!
//! ```text
//! Connected --join/create ok--> InRoom --quit-room ok--> Connected
//!     |                           |
//!     +------ read error / EOF / QUIT_SYSTEM / shutdown ------> Closed
//! ```
//!
//! The read loop decodes one request at a time and answers it before
//! reading the next, so a connection's chat messages reach its room in the
//! order they were sent. Everything written to the socket goes through the
//! session's outbound queue, drained by a dedicated writer task.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
};
use tokio_util::codec::{FramedRead, FramedWrite};

use hiroba_shared::{
    protocol::{ChatMessage, FrameCodec, MAX_FRAME_SIZE, Request, ServerMessage},
    time::{Clock, timestamp_to_rfc3339},
};

use crate::domain::{ConnectionId, Member, PusherChannel, RoomName, RoomRegistry};

use super::{error::SessionError, state::ServerContext};

/// How long a closing session waits for queued frames to be written
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, not in a room
    Connected,
    /// Member of the given room
    InRoom(RoomName),
    /// Terminal
    Closed,
}

/// Protocol state of one connection
pub struct Session {
    id: ConnectionId,
    state: SessionState,
    outbound: PusherChannel,
    registry: Arc<dyn RoomRegistry>,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        outbound: PusherChannel,
        registry: Arc<dyn RoomRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            state: SessionState::Connected,
            outbound,
            registry,
            clock,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_room(&self) -> Option<&RoomName> {
        match &self.state {
            SessionState::InRoom(room) => Some(room),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Handle one decoded request.
    ///
    /// Returns the direct response, if the request has one. A successful
    /// chat has none: the sender receives its own message through the room
    /// broadcast.
    pub async fn handle_request(&mut self, request: Request) -> Option<ServerMessage> {
        let kind = request.message_type();
        let result = match request {
            Request::ListRooms => Ok(Some(ServerMessage::RoomList(
                self.registry.list_rooms().await,
            ))),
            Request::JoinRoom { room } => self.join_room(room).await.map(Some),
            Request::CreateRoom { room } => self.create_room(room).await.map(Some),
            Request::QuitRoom => self.quit_room().await.map(Some),
            Request::Chat { text } => self.chat(text).await.map(|()| None),
            Request::QuitSystem => {
                tracing::info!("{} requested to quit", self.id);
                self.close().await;
                Ok(None)
            }
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("{} request {:?} failed: {}", self.id, kind, e);
                Some(ServerMessage::Failure {
                    request: kind,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn join_room(&mut self, room: String) -> Result<ServerMessage, SessionError> {
        self.ensure_not_in_room()?;
        let name = RoomName::new(room)?;
        self.registry.join_room(self.member(), &name).await?;

        let response = ServerMessage::JoinedRoom(name.as_str().to_string());
        self.state = SessionState::InRoom(name);
        Ok(response)
    }

    async fn create_room(&mut self, room: String) -> Result<ServerMessage, SessionError> {
        self.ensure_not_in_room()?;
        let name = RoomName::new(room)?;
        self.registry.create_room(name.clone(), self.member()).await?;

        let response = ServerMessage::CreatedRoom(name.as_str().to_string());
        self.state = SessionState::InRoom(name);
        Ok(response)
    }

    async fn quit_room(&mut self) -> Result<ServerMessage, SessionError> {
        let name = self.current_room().cloned().ok_or(SessionError::NotInRoom)?;
        let result = self.registry.leave_room(self.id, &name).await;

        // Whatever the registry answered, this connection is no longer in
        // that room afterwards.
        self.state = SessionState::Connected;
        result?;
        Ok(ServerMessage::LeftRoom)
    }

    async fn chat(&mut self, text: String) -> Result<(), SessionError> {
        let name = self.current_room().cloned().ok_or(SessionError::NotInRoom)?;
        let message_date = self.clock.now_millis();
        let message = ChatMessage {
            user: self.id.to_string(),
            msg: text,
            date: message_date,
        };

        let frame = ServerMessage::Chat(message).encode()?;
        if frame.len() > MAX_FRAME_SIZE {
            return Err(SessionError::MessageTooLong {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let delivered = self.registry.broadcast(&name, frame).await?;
        tracing::debug!(
            "{} chatted in '{}' at {}, delivered to {} member(s)",
            self.id,
            name,
            timestamp_to_rfc3339(message_date),
            delivered
        );
        Ok(())
    }

    /// Transition to Closed, leaving the current room if any
    pub async fn close(&mut self) {
        if let SessionState::InRoom(name) = &self.state
            && let Err(e) = self.registry.leave_room(self.id, name).await
        {
            tracing::warn!("{} failed to leave '{}' on close: {}", self.id, name, e);
        }
        self.state = SessionState::Closed;
    }

    /// Queue a response on this session's own outbound queue.
    ///
    /// A response that cannot be encoded into one frame is replaced by a
    /// failure response for the same request.
    pub fn reply(&self, message: ServerMessage) {
        let frame = match encode_response(&message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Cannot send response to {}: {}", self.id, e);
                let failure = ServerMessage::Failure {
                    request: message.message_type(),
                    reason: e.to_string(),
                };
                match encode_response(&failure) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!("Failed to encode failure for {}: {}", self.id, e);
                        return;
                    }
                }
            }
        };

        if self.outbound.send(frame).is_err() {
            tracing::debug!("{} writer is gone, response dropped", self.id);
        }
    }

    fn ensure_not_in_room(&self) -> Result<(), SessionError> {
        match &self.state {
            SessionState::InRoom(room) => {
                Err(SessionError::AlreadyInRoom(room.as_str().to_string()))
            }
            _ => Ok(()),
        }
    }

    fn member(&self) -> Member {
        Member::new(self.id, self.outbound.clone())
    }
}

/// Encode a response, refusing anything the frame codec would reject
fn encode_response(message: &ServerMessage) -> Result<Bytes, SessionError> {
    let frame = message.encode()?;
    if frame.len() > MAX_FRAME_SIZE {
        return Err(SessionError::ResponseTooLarge {
            size: frame.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(frame)
}

/// Spawns a task that drains the outbound queue into the socket.
///
/// The task ends when every sender is dropped or a write fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Bytes>,
    mut writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
    id: ConnectionId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = writer.send(frame).await {
                tracing::warn!("Failed to write to {}: {}", id, e);
                break;
            }
        }
    })
}

/// Serve one accepted connection until it closes.
///
/// The caller has already counted the connection as live; this function
/// always records it as closed before returning.
pub(crate) async fn run_session(stream: TcpStream, peer: SocketAddr, context: Arc<ServerContext>) {
    let id = context.next_connection_id();
    tracing::info!("{} connected from {}", id, peer);

    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, FrameCodec::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let mut writer_task = pusher_loop(rx, FramedWrite::new(write_half, FrameCodec::new()), id);
    let mut writer_done = false;

    let mut session = Session::new(id, tx, context.registry.clone(), context.clock.clone());

    while !session.is_closed() {
        tokio::select! {
            _ = context.shutdown.cancelled() => {
                tracing::info!("Closing {} for server shutdown", id);
                break;
            }
            _ = &mut writer_task => {
                writer_done = true;
                tracing::info!("{} can no longer be written to", id);
                break;
            }
            frame = reader.next() => match frame {
                Some(Ok(body)) => match Request::decode(&body) {
                    Ok(request) => {
                        tracing::debug!("{} -> {:?}", id, request.message_type());
                        if let Some(response) = session.handle_request(request).await {
                            session.reply(response);
                        }
                    }
                    Err(e) => tracing::warn!("Dropping frame from {}: {}", id, e),
                },
                Some(Err(e)) => {
                    tracing::warn!("Read error on {}: {}", id, e);
                    break;
                }
                None => {
                    tracing::info!("{} closed the connection", id);
                    break;
                }
            }
        }
    }

    session.close().await;
    let live = context.connection_closed();
    tracing::info!("{} disconnected, current connection count: {}", id, live);

    // Dropping the session drops the last sender, so the writer drains
    // what is queued and exits.
    drop(session);
    if !writer_done
        && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
            .await
            .is_err()
    {
        writer_task.abort();
    }
}
