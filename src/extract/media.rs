//! Screenshot file naming and saving

use super::timestamp::iso;
use super::CrawlIssues;
use crate::browser::{BrowserSession, Element};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Author part of a media file name: spaces become underscores and path
/// separators are dropped
pub fn normalize_author(author: &str) -> String {
    author
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// `{folder}/{author}_{iso}.png`, with an optional frame index before the
/// extension so gallery frames sharing a minute do not overwrite each other
pub fn media_path(
    folder: &Path,
    author: Option<&str>,
    timestamp: Option<&NaiveDateTime>,
    frame: Option<usize>,
) -> PathBuf {
    let author = author
        .map(normalize_author)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let when = timestamp.map(iso).unwrap_or_else(|| "undated".to_string());
    let name = match frame {
        Some(index) => format!("{}_{}_{}.png", author, when, index),
        None => format!("{}_{}.png", author, when),
    };
    folder.join(name)
}

/// Screenshots `element` into `path`.
///
/// Failures are logged and counted, never propagated: media is best-effort.
pub async fn save_screenshot<S>(
    session: &S,
    element: Element,
    path: PathBuf,
    issues: &mut CrawlIssues,
) -> Option<PathBuf>
where
    S: BrowserSession + ?Sized,
{
    let bytes = match session.screenshot_element(element).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Screenshot for {} failed: {}", path.display(), e);
            issues.failed_screenshots += 1;
            return None;
        }
    };

    match std::fs::write(&path, bytes) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Failed to write {}: {}", path.display(), e);
            issues.failed_screenshots += 1;
            None
        }
    }
}
