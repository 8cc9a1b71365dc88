//! Per-post extraction pipeline
//!
//! # Components
//!
//! - `entry`: turns one rendered feed entry into a [`PostRecord`](crate::PostRecord)
//! - `comments`: expands collapsed threads and normalizes comment text
//! - `gallery`: walks the lightbox of a multi-image post
//! - `media`: screenshot naming and saving
//! - `timestamp`: post and lightbox time formats

pub mod comments;
pub mod entry;
pub mod gallery;
pub mod media;
pub mod timestamp;

pub use comments::{collect_comments, normalize_comment};
pub use entry::{extract_entry, read_raw_timestamp};
pub use gallery::walk_gallery;

use crate::config::{LimitsConfig, OutputConfig};
use crate::feed::FeedKind;
use crate::pacing::Pacing;
use serde::Serialize;
use std::path::PathBuf;

/// Everything extraction needs to know about the target being harvested
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub kind: FeedKind,
    /// Target name stamped on every record
    pub page: &'a str,
    pub limits: &'a LimitsConfig,
    pub pacing: &'a Pacing,
    pub folders: &'a MediaFolders,
}

/// Where screenshots are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFolders {
    pub images: PathBuf,
    pub thumbnails: PathBuf,
}

impl MediaFolders {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            images: PathBuf::from(&config.images_folder),
            thumbnails: PathBuf::from(&config.thumbnails_folder),
        }
    }

    /// Creates both folders if they do not exist yet
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.images)?;
        std::fs::create_dir_all(&self.thumbnails)
    }
}

/// Recoverable problems met during a harvest
///
/// None of these stop a target; they are counted so a run summary can show
/// how much was skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlIssues {
    /// Lightbox did not open within the wait timeout
    pub gallery_open_timeouts: u32,
    /// Clicks swallowed by an overlay
    pub blocked_clicks: u32,
    /// Entries with neither author nor timestamp
    pub malformed_entries: u32,
    /// Entries dropped because the browser failed while reading them
    pub failed_entries: u32,
    /// Optional fields left empty because the browser failed while reading them
    pub failed_fields: u32,
    /// Screenshots that could not be taken or written
    pub failed_screenshots: u32,
}

impl CrawlIssues {
    pub fn total(&self) -> u32 {
        self.gallery_open_timeouts
            + self.blocked_clicks
            + self.malformed_entries
            + self.failed_entries
            + self.failed_fields
            + self.failed_screenshots
    }
}
