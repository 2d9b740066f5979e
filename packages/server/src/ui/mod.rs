//! Connection-facing layer: TCP listener, per-connection sessions and the
//! process-scoped server context.

mod error;
mod server;
mod session;
mod signal;
pub mod state;

pub use error::SessionError;
pub use server::Server;
pub use session::{Session, SessionState};
pub use signal::shutdown_signal;
pub use state::ServerContext;
