//! Feed-Tide: an incremental social-feed harvester
//!
//! This crate drives a browser session over scroll-paginated group and page feeds,
//! keeps a consistent view of the feed across refreshes, and extracts one structured
//! record per post (author, timestamp, text, link, comments and media).

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod feed;
pub mod output;
pub mod pacing;
pub mod state;

use thiserror::Error;

/// Main error type for Feed-Tide operations
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Feed at {url} did not become ready after {attempts} attempts")]
    TooManyAttempts { url: String, attempts: u32 },

    #[error("Anchor {anchor:?} not found in feed of '{target}' after refresh")]
    AnchorNotFound { target: String, anchor: String },

    #[error("Feed of '{target}' stopped yielding entries at offset {offset} while still growing")]
    Stalled { target: String, offset: usize },

    #[error("Malformed entry: {reason}")]
    MalformedEntry { reason: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Result type alias for Feed-Tide operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{BrowserSession, Element, Locator};
pub use config::Config;
pub use crawler::{run_harvest, Harvester, TargetReport};
pub use feed::{FeedKind, Media, PageTarget, PostRecord};
