//! Integration tests for the harvester
//!
//! These tests drive the full pipeline against `FakeFeed`, an in-memory
//! browser session serving scripted group and page feeds.

mod extraction_tests;
mod harvest_tests;

use fake_feed::{FakeFeed, FakePost};
use feed_tide::config::{
    BrowserConfig, Config, LimitsConfig, OutputConfig, SessionConfig, TargetEntry,
};
use feed_tide::crawler::Harvester;
use feed_tide::feed::FeedKind;
use feed_tide::pacing::Pacing;
use std::path::Path;

pub const GROUP_URL: &str = "https://www.facebook.com/groups/111";
pub const PAGE_URL: &str = "https://www.facebook.com/beta/posts/";

pub fn group_entry() -> TargetEntry {
    TargetEntry {
        name: "Alpha".to_string(),
        kind: FeedKind::Group,
        id: "111".to_string(),
    }
}

pub fn page_entry() -> TargetEntry {
    TargetEntry {
        name: "Beta".to_string(),
        kind: FeedKind::Page,
        id: "beta".to_string(),
    }
}

/// Creates a test configuration writing everything under `dir`
pub fn create_test_config(dir: &Path, limits: LimitsConfig, targets: Vec<TargetEntry>) -> Config {
    Config {
        session: SessionConfig::default(),
        limits,
        output: OutputConfig {
            database_path: dir.join("feed.db").display().to_string(),
            summary_path: dir.join("summary.md").display().to_string(),
            images_folder: dir.join("images").display().to_string(),
            thumbnails_folder: dir.join("thumbnails").display().to_string(),
        },
        browser: BrowserConfig::default(),
        targets,
    }
}

/// Harvester over `feed` with no delays
pub fn harvester(feed: FakeFeed, config: Config) -> Harvester<FakeFeed> {
    Harvester::new(feed, config)
        .expect("Failed to create harvester")
        .with_pacing(Pacing::immediate())
}

/// `count` numbered text-only posts
pub fn numbered_posts(count: usize) -> Vec<FakePost> {
    (0..count).map(FakePost::numbered).collect()
}
