//! Last-known state of underlying-system tags, kept for a node manager that
//! publishes them through OPC UA.

pub mod config;
pub mod error;
pub mod logging;
pub mod tags;

pub use error::{Result, TagError};
pub use tags::engine::{TagEngine, TagKey};
pub use tags::state::TagState;
