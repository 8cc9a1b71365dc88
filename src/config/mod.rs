//! Configuration module for Feed-Tide
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feed_tide::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feeds.toml")).unwrap();
//! println!("Chunk size: {}", config.limits.chunk_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AttemptScope, BrowserConfig, Config, LimitsConfig, OutputConfig, SessionConfig,
    TargetEntry, Traversal,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
