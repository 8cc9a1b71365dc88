use crate::feed::{FeedKind, PageTarget};
use serde::Deserialize;

/// Main configuration structure for Feed-Tide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

/// Timing and page-load behavior of the browser session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Origin the feed paths are joined onto
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// How long to wait for the feed or the lightbox to appear (milliseconds)
    #[serde(rename = "wait-timeout-ms", default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Pause after navigation before the page is inspected (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Pause after each scroll-to-bottom (milliseconds)
    #[serde(rename = "scroll-delay-ms", default = "default_scroll_delay")]
    pub scroll_delay_ms: u64,

    /// Pause after clicks and hovers (milliseconds)
    #[serde(rename = "action-delay-ms", default = "default_action_delay")]
    pub action_delay_ms: u64,

    /// Whether the page-load attempt budget is shared across targets
    #[serde(rename = "attempt-scope", default)]
    pub attempt_scope: AttemptScope,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            wait_timeout_ms: default_wait_timeout(),
            settle_delay_ms: default_settle_delay(),
            scroll_delay_ms: default_scroll_delay(),
            action_delay_ms: default_action_delay(),
            attempt_scope: AttemptScope::default(),
        }
    }
}

/// Scope of the page-load attempt counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptScope {
    /// One budget for the whole browser session
    #[default]
    Session,
    /// The counter is reset before every target
    Target,
}

/// How a feed is traversed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Grow the feed in chunks and reload between them
    #[default]
    Chunked,
    /// Scroll until the feed stops growing, then extract everything at once
    Bulk,
}

/// Per-run extraction and traversal limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum comments kept per post
    #[serde(rename = "max-comments", default = "default_max_comments")]
    pub max_comments: usize,

    /// Maximum images collected per post
    #[serde(rename = "max-images", default = "default_max_images")]
    pub max_images: usize,

    /// Maximum scroll steps per pass (unbounded when absent)
    #[serde(rename = "max-scroll-depth", default)]
    pub max_scroll_depth: Option<u32>,

    /// Failed page-load waits tolerated before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Entries extracted between two page reloads
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Extra entries loaded past the chunk before scrolling stops
    #[serde(rename = "chunk-margin", default = "default_chunk_margin")]
    pub chunk_margin: usize,

    /// Upper bound on "more comments" clicks per post
    #[serde(
        rename = "max-comment-expansions",
        default = "default_max_comment_expansions"
    )]
    pub max_comment_expansions: u32,

    #[serde(default)]
    pub traversal: Traversal,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_comments: default_max_comments(),
            max_images: default_max_images(),
            max_scroll_depth: None,
            max_attempts: default_max_attempts(),
            chunk_size: default_chunk_size(),
            chunk_margin: default_chunk_margin(),
            max_comment_expansions: default_max_comment_expansions(),
            traversal: Traversal::default(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database receiving the records
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,

    /// Folder for inline and gallery image screenshots
    #[serde(rename = "images-folder", default = "default_images_folder")]
    pub images_folder: String,

    /// Folder for video thumbnail screenshots
    #[serde(rename = "thumbnails-folder", default = "default_thumbnails_folder")]
    pub thumbnails_folder: String,
}

/// Browser launch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Chromium executable, detected on PATH when absent
    #[serde(default)]
    pub executable: Option<String>,

    /// Profile directory holding an already logged-in session
    #[serde(rename = "user-data-dir", default)]
    pub user_data_dir: Option<String>,

    #[serde(default = "default_headless")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            user_data_dir: None,
            headless: default_headless(),
        }
    }
}

/// One feed to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEntry {
    /// Display name, copied into every record of this target
    pub name: String,

    /// Either "group" or "page"
    pub kind: FeedKind,

    /// Site identifier of the group or page
    pub id: String,
}

impl From<&TargetEntry> for PageTarget {
    fn from(entry: &TargetEntry) -> Self {
        PageTarget::new(&entry.name, entry.kind, &entry.id)
    }
}

fn default_base_url() -> String {
    "https://www.facebook.com".to_string()
}

fn default_wait_timeout() -> u64 {
    15_000
}

fn default_settle_delay() -> u64 {
    1_000
}

fn default_scroll_delay() -> u64 {
    3_000
}

fn default_action_delay() -> u64 {
    1_000
}

fn default_max_comments() -> usize {
    25
}

fn default_max_images() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    10
}

fn default_chunk_size() -> usize {
    20
}

fn default_chunk_margin() -> usize {
    5
}

fn default_max_comment_expansions() -> u32 {
    50
}

fn default_images_folder() -> String {
    "./images".to_string()
}

fn default_thumbnails_folder() -> String {
    "./thumbnails".to_string()
}

fn default_headless() -> bool {
    true
}
