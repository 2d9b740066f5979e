//! Client protocol driver: connection, background reader and reconnect.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
    task::JoinHandle,
};
use tokio_util::codec::{FramedRead, FramedWrite};

use hiroba_shared::protocol::{FrameCodec, Request, ServerMessage};

use crate::{
    domain::{Action, plan_line, should_attempt_reconnect},
    error::ClientError,
    state::{MirrorState, Mode},
};

/// Connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Delay between opening a connection and checking that it is alive
    pub reconnect_interval: Duration,
}

/// Something the terminal should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A connection was established
    Connected,
    /// Decoded server message
    Received(ServerMessage),
    /// Local diagnostic
    Notice(String),
    /// Show the command menu
    Help,
    /// Chat mode was entered
    ChatModeEntered,
    /// The reader saw the connection end
    Disconnected,
    /// A reconnect attempt is starting
    Reconnecting { attempt: u32, max_attempts: u32 },
    /// Every reconnect attempt failed
    ReconnectFailed,
}

/// Result of handling one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    /// The user asked to quit
    Quit,
    /// The connection was lost and every reconnect attempt failed
    GaveUp,
}

/// One client's connection and mirrored state
pub struct ChatClient {
    config: ClientConfig,
    state: Arc<MirrorState>,
    events: mpsc::UnboundedSender<ClientEvent>,
    writer: Option<FramedWrite<OwnedWriteHalf, FrameCodec>>,
    reader_task: Option<JoinHandle<()>>,
}

impl ChatClient {
    /// Connect to the configured server
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionError`] if the server is unreachable.
    pub async fn connect(
        config: ClientConfig,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<Self, ClientError> {
        let mut client = Self {
            config,
            state: Arc::new(MirrorState::new()),
            events,
            writer: None,
            reader_task: None,
        };
        client.open_connection().await?;
        client.emit(ClientEvent::Connected);
        Ok(client)
    }

    pub fn state(&self) -> Arc<MirrorState> {
        self.state.clone()
    }

    /// Interpret one input line and act on it
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        if !self.state.is_alive() {
            // The server no longer knows this client; the line is dropped.
            self.emit(ClientEvent::Notice(
                "connection lost, the last input was not sent".to_string(),
            ));
            return self.reconnect_outcome().await;
        }

        let mirror = self.state.snapshot().await;
        let action = match plan_line(&mirror, line) {
            Ok(action) => action,
            Err(e @ ClientError::InvalidCommand(_)) => {
                self.emit(ClientEvent::Notice(e.to_string()));
                self.emit(ClientEvent::Help);
                return LineOutcome::Continue;
            }
            Err(e) => {
                self.emit(ClientEvent::Notice(e.to_string()));
                return LineOutcome::Continue;
            }
        };

        match action {
            Action::Ignore => LineOutcome::Continue,
            Action::EnterChat => {
                self.state.set_mode(Mode::Chatting).await;
                self.emit(ClientEvent::ChatModeEntered);
                LineOutcome::Continue
            }
            Action::ExitChat => {
                self.state.set_mode(Mode::Command).await;
                self.emit(ClientEvent::Help);
                LineOutcome::Continue
            }
            Action::Quit => {
                if let Err(e) = self.send(Request::QuitSystem).await {
                    tracing::debug!("Failed to send quit: {}", e);
                }
                self.shutdown().await;
                LineOutcome::Quit
            }
            Action::Send(request) => match self.send(request).await {
                Ok(()) => LineOutcome::Continue,
                Err(e) => {
                    tracing::warn!("Failed to send request: {}", e);
                    self.state.mark_dead();
                    self.reconnect_outcome().await
                }
            },
        }
    }

    /// Run the reconnect procedure.
    ///
    /// Each attempt opens a new connection, waits the configured interval
    /// and checks that the connection is still alive. Returns `false` once
    /// every attempt has failed, after shutting the client down.
    pub async fn reconnect(&mut self) -> bool {
        let max_attempts = self.config.max_reconnect_attempts;
        let mut last_error = ClientError::ConnectionError("connection lost".to_string());
        let mut attempt = 0;

        while should_attempt_reconnect(&last_error, attempt, max_attempts) {
            attempt += 1;
            tracing::info!("Reconnecting (attempt {}/{})", attempt, max_attempts);
            self.emit(ClientEvent::Reconnecting {
                attempt,
                max_attempts,
            });

            if let Err(e) = self.open_connection().await {
                tracing::warn!("Reconnect attempt {} failed: {}", attempt, e);
                last_error = e;
            }
            tokio::time::sleep(self.config.reconnect_interval).await;

            if self.state.is_alive() {
                tracing::info!("Reconnected");
                self.emit(ClientEvent::Connected);
                return true;
            }
        }

        tracing::error!("Failed to reconnect after {} attempts", attempt);
        self.emit(ClientEvent::ReconnectFailed);
        self.shutdown().await;
        false
    }

    /// Close the connection for good
    pub async fn shutdown(&mut self) {
        self.stop_reader().await;
        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.close().await
        {
            tracing::debug!("Error while closing connection: {}", e);
        }
        self.state.mark_dead();
    }

    async fn reconnect_outcome(&mut self) -> LineOutcome {
        if self.reconnect().await {
            LineOutcome::Continue
        } else {
            LineOutcome::GaveUp
        }
    }

    async fn send(&mut self, request: Request) -> Result<(), ClientError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ClientError::ConnectionError("not connected".to_string()))?;
        writer.send(request.encode()).await?;
        Ok(())
    }

    /// Open a fresh connection and start its reader.
    ///
    /// The server keeps nothing from an earlier connection, so the mirror is
    /// reset first.
    async fn open_connection(&mut self) -> Result<(), ClientError> {
        self.stop_reader().await;
        self.writer = None;

        let address = format!("{}:{}", self.config.host, self.config.port);
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| ClientError::ConnectionError(format!("{}: {}", address, e)))?;
        tracing::info!("Connected to {}", address);

        let (read_half, write_half) = stream.into_split();
        self.state.reset().await;
        self.state.mark_alive();
        self.reader_task = Some(tokio::spawn(reader_loop(
            FramedRead::new(read_half, FrameCodec::new()),
            self.state.clone(),
            self.events.clone(),
        )));
        self.writer = Some(FramedWrite::new(write_half, FrameCodec::new()));
        Ok(())
    }

    async fn stop_reader(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Event receiver is gone");
        }
    }
}

/// Decode server messages, update the mirror and forward them as events
/// until the connection ends.
async fn reader_loop(
    mut reader: FramedRead<OwnedReadHalf, FrameCodec>,
    state: Arc<MirrorState>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(body) => match ServerMessage::decode(&body) {
                Ok(message) => {
                    state.apply(&message).await;
                    let _ = events.send(ClientEvent::Received(message));
                }
                Err(e) => tracing::warn!("Dropping frame from server: {}", e),
            },
            Err(e) => {
                tracing::warn!("Read error: {}", e);
                break;
            }
        }
    }

    tracing::info!("Server closed the connection");
    state.mark_dead();
    let _ = events.send(ClientEvent::Disconnected);
}
