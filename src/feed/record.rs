//! Records produced for each extracted post

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Media attached to a post
///
/// Inline image, gallery and thumbnail are mutually exclusive, so a post
/// carries exactly one of these variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "files", rename_all = "snake_case")]
pub enum Media {
    #[default]
    None,
    /// A single image screenshotted straight from the feed
    Inline(PathBuf),
    /// Frames collected by walking the lightbox, in visitation order
    Gallery(Vec<PathBuf>),
    /// Video poster frame
    Thumbnail(PathBuf),
}

/// One filled media slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub slot: usize,
    pub file_path: PathBuf,
}

impl Media {
    /// File stored in `slot`, if any
    pub fn slot(&self, slot: usize) -> Option<&Path> {
        match self {
            Media::None => None,
            Media::Inline(path) | Media::Thumbnail(path) => (slot == 0).then_some(path.as_path()),
            Media::Gallery(paths) => paths.get(slot).map(PathBuf::as_path),
        }
    }

    /// Filled slots in order
    pub fn items(&self) -> Vec<MediaItem> {
        let paths: Vec<&PathBuf> = match self {
            Media::None => Vec::new(),
            Media::Inline(path) | Media::Thumbnail(path) => vec![path],
            Media::Gallery(paths) => paths.iter().collect(),
        };
        paths
            .into_iter()
            .enumerate()
            .map(|(slot, path)| MediaItem {
                slot,
                file_path: path.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Media::None => true,
            Media::Gallery(paths) => paths.is_empty(),
            _ => false,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Media::None => "none",
            Media::Inline(_) => "inline",
            Media::Gallery(_) => "gallery",
            Media::Thumbnail(_) => "thumbnail",
        }
    }
}

/// Structured content of one rendered post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    /// The post showed the "content isn't available" marker
    pub unavailable: bool,
    pub author: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    /// Post body, empty when the post has no message
    pub text: String,
    pub link: Option<String>,
    /// Normalized comments in document order
    pub comments: Vec<String>,
    pub media: Media,
    /// Name of the target the post was harvested from
    pub page: String,
}

impl PostRecord {
    /// Flattens the record into named columns for tabular export
    ///
    /// Comment and image columns are numbered from zero up to the configured
    /// limits; missing values are `None`.
    pub fn columns(&self, max_comments: usize, max_images: usize) -> Vec<(String, Option<String>)> {
        let mut columns = vec![
            ("unavailable".to_string(), Some(self.unavailable.to_string())),
            ("author".to_string(), self.author.clone()),
            (
                "timestamp".to_string(),
                self.timestamp.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ),
            ("link".to_string(), self.link.clone()),
            ("text".to_string(), Some(self.text.clone())),
            ("page".to_string(), Some(self.page.clone())),
        ];
        for index in 0..max_comments {
            columns.push((format!("comment_{}", index), self.comments.get(index).cloned()));
        }
        for index in 0..max_images {
            columns.push((
                format!("image_{}", index),
                self.media.slot(index).map(|p| p.display().to_string()),
            ));
        }
        columns
    }
}
