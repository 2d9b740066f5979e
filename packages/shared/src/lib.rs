//! Shared building blocks for the Hiroba chat server and client.
//!
//! - [`protocol`]: frame codec and the typed messages carried inside frames.
//! - [`time`]: clock abstraction and timestamp formatting.
//! - [`logger`]: tracing subscriber setup for the binaries.

pub mod logger;
pub mod protocol;
pub mod time;
