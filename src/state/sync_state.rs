//! Synchronization phases of a chunked feed traversal

use std::fmt;

/// Phase of the feed synchronizer for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    /// Bringing the feed to a ready state
    Loading,

    /// Growing the feed to the next chunk threshold
    Scrolling,

    /// Extracting the current batch
    Extracting,

    /// Reloading the page and re-locating the anchor
    Resynchronizing,

    /// Feed exhausted, no further work
    Done,
}

impl SyncPhase {
    /// Whether the synchronizer may move from `self` to `next`
    pub fn can_transition_to(&self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Loading, Scrolling)
                | (Scrolling, Extracting)
                | (Extracting, Resynchronizing)
                | (Extracting, Done)
                | (Resynchronizing, Scrolling)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Scrolling => "scrolling",
            Self::Extracting => "extracting",
            Self::Resynchronizing => "resynchronizing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker used to find a known post again after a reload
///
/// This is the raw timestamp string of the first post seen when chunking
/// started. The site exposes no stable post id, so the anchor is matched by
/// substring against rendered markup and can in principle match an unrelated
/// entry carrying the same string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor(String);

impl Anchor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `markup` contains the anchor
    pub fn matches(&self, markup: &str) -> bool {
        !self.0.is_empty() && markup.contains(&self.0)
    }

    /// Index of the first markup fragment containing the anchor
    pub fn locate<'a, I>(&self, markups: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        markups.into_iter().position(|markup| self.matches(markup))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
