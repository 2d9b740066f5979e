//! Hiroba chat room server.
//!
//! - `domain`: value objects, rooms and the registry trait
//! - `infrastructure`: the in-memory registry
//! - `ui`: TCP listener and per-connection sessions

pub mod domain;
pub mod infrastructure;
pub mod ui;
