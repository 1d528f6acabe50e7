use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the registry and configuration layers.
///
/// `TagState` itself never fails; these come from the code that owns tags.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Tag not found: {block}/{name}")]
    TagNotFound { block: String, name: String },

    #[error("Stale update for {block}/{name}: {attempted} is older than {current}")]
    StaleTimestamp {
        block: String,
        name: String,
        current: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TagError>;
