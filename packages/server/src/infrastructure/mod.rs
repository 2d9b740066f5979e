//! Infrastructure layer: concrete implementations of the domain seams.

pub mod registry;

pub use registry::InMemoryRoomRegistry;
