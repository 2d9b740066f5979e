//! Hiroba chat client.
//!
//! Connects to a Hiroba server, mirrors the server-confirmed room and mode
//! and reconnects a bounded number of times when the connection drops.

mod command;
mod domain;
pub mod error;
mod formatter;
mod runner;
pub mod session;
pub mod state;
mod ui;

pub use error::ClientError;
pub use runner::run_client;
pub use session::{ChatClient, ClientConfig, ClientEvent, LineOutcome};
pub use state::{Mirror, MirrorState, Mode};
