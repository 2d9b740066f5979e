//! TCP listener and accept loop.

use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use tokio::net::{TcpListener, ToSocketAddrs};

use super::{session::run_session, signal::shutdown_signal, state::ServerContext};

const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before accepting again after `consecutive_failures` failed accepts.
///
/// Doubles from 10ms per failure, capped at one second.
fn accept_backoff(consecutive_failures: u32) -> Duration {
    let factor = 1u32 << consecutive_failures.saturating_sub(1).min(10);
    ACCEPT_BACKOFF_BASE
        .saturating_mul(factor)
        .min(ACCEPT_BACKOFF_MAX)
}

/// TCP chat room server
///
/// # Example
///
/// ```ignore
/// let server = Server::bind("127.0.0.1:8080", Arc::new(ServerContext::in_memory())).await?;
/// server.run().await?;
/// ```
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Wrap an already bound listener
    pub fn new(listener: TcpListener, context: Arc<ServerContext>) -> Self {
        Self { listener, context }
    }

    /// Bind a listener on `addr`
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs, context: Arc<ServerContext>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, context))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> Arc<ServerContext> {
        self.context.clone()
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> io::Result<()> {
        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.run_until(shutdown_signal()).await
    }

    /// Accept connections until `shutdown` resolves or the context's
    /// shutdown token is cancelled, then close every session and wait for
    /// them to finish.
    ///
    /// A failed `accept` is logged and retried after a delay that grows
    /// with each consecutive failure.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let context = self.context;
        tracing::info!("Chat server listening on {}", self.listener.local_addr()?);

        tokio::pin!(shutdown);
        let mut accept_failures: u32 = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = context.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        accept_failures = 0;
                        let live = context.connection_opened();
                        tracing::info!(
                            "Accepted connection from {}, current connection count: {}",
                            peer,
                            live
                        );
                        context.tasks.spawn(run_session(stream, peer, context.clone()));
                    }
                    Err(e) => {
                        accept_failures = accept_failures.saturating_add(1);
                        let delay = accept_backoff(accept_failures);
                        tracing::warn!("Failed to accept connection: {}, retrying in {:?}", e, delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        tracing::info!("Shutting down, closing {} connection(s)", context.live_connections());
        context.shutdown.cancel();
        context.tasks.close();
        context.tasks.wait().await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
