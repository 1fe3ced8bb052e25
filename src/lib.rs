//! WikiGraph: a resumable Wikipedia link-graph crawler
//!
//! This crate walks the Wikipedia hyperlink graph breadth-first from a set of seed
//! articles, appends every discovered node and edge to durable JSON-lines logs, and
//! checkpoints its frontier so an interrupted crawl picks up where it stopped. Once the
//! frontier drains, the logs are consolidated into a sized node/edge export.

pub mod config;
pub mod crawler;
pub mod health;
pub mod output;
pub mod state;
pub mod storage;
pub mod title;

use thiserror::Error;

/// Main error type for WikiGraph operations
#[derive(Debug, Error)]
pub enum WikiGraphError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for '{title}': {source}")]
    Fetch {
        title: String,
        source: crawler::FetchError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint at {path} unusable: {source}")]
    Checkpoint {
        path: String,
        source: storage::StorageError,
    },

    #[error("Invalid engine transition: {from} -> {to}")]
    InvalidTransition {
        from: state::EnginePhase,
        to: state::EnginePhase,
    },

    #[error("Notification error: {0}")]
    Notify(#[from] health::NotifyError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for WikiGraph operations
pub type Result<T> = std::result::Result<T, WikiGraphError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{CrawlState, EnginePhase, FrontierItem, FrontierStore};
pub use title::{article_url, display_label, is_namespaced};
