//! Feed kinds and the markup each one is read with
//!
//! Groups and pages render posts with different containers, thumbnails and
//! link markup, so every kind carries its own locator set and link policy.

use crate::browser::Locator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two site surfaces a feed can live on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Group,
    Page,
}

/// How a feed kind decides whether a post carries a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Only look for the link when the entry text contains the cue
    TextCue(&'static str),
    /// Always look for the link element
    AlwaysLookup,
}

/// Locators used to read one feed kind
#[derive(Debug)]
pub struct LocatorSet {
    /// Top-level post containers in the feed
    pub entries: Locator,
    /// Author name link, in fallback order
    pub author: &'static [Locator],
    /// Element whose `title` holds the post time, in fallback order
    pub timestamp: &'static [Locator],
    pub post_message: Locator,
    pub see_more: Locator,
    pub link: Locator,
    pub theater_images: Locator,
    pub more_images_badge: Locator,
    /// Video poster frames, in fallback order
    pub thumbnails: &'static [Locator],
    pub comments: Locator,
    pub more_comments: Locator,
    pub more_replies: Locator,
}

/// Locators of the lightbox image viewer, shared by both kinds
#[derive(Debug)]
pub struct LightboxLocators {
    pub timestamp: Locator,
    pub timestamp_title: Locator,
    pub author: Locator,
    pub image: Locator,
    pub next: Locator,
}

pub const LIGHTBOX: LightboxLocators = LightboxLocators {
    timestamp: Locator::xpath("//span[@id='fbPhotoSnowliftTimestamp']"),
    timestamp_title: Locator::xpath("//span[@id='fbPhotoSnowliftTimestamp']//abbr"),
    author: Locator::xpath("//div[@id='fbPhotoSnowliftAuthorName']/a[1]"),
    image: Locator::css(".spotlight"),
    next: Locator::xpath("//a[@title = 'Next']"),
};

const AUTHOR: &[Locator] = &[
    Locator::xpath(".//span[starts-with(@class, 'fwb')]/a"),
    Locator::xpath(".//h5//a[not(@data-hovercard-prefer-more-content-show)]"),
    Locator::xpath(".//a[contains(@class, 'profileLink')]"),
];

const TIMESTAMP: &[Locator] = &[
    Locator::xpath(".//*[starts-with(@class, '_5ptz')]"),
    Locator::xpath(".//abbr[@data-utime]"),
];

const GROUP_THUMBNAILS: &[Locator] = &[
    Locator::xpath(".//img[starts-with(@class, '_1445')]"),
    Locator::xpath(".//img[@class = 'scaledImageFitWidth img']"),
    Locator::xpath(".//a/div/img"),
];

const PAGE_THUMBNAILS: &[Locator] = &[
    Locator::xpath(".//img[@class = 'scaledImageFitWidth img']"),
    Locator::xpath(".//a/div/img"),
];

const GROUP_LOCATORS: LocatorSet = LocatorSet {
    entries: Locator::xpath("//div[starts-with(@id, 'mall_post_')]"),
    author: AUTHOR,
    timestamp: TIMESTAMP,
    post_message: Locator::xpath(".//*[@data-testid='post_message']"),
    see_more: Locator::xpath(".//*[text()='See More']"),
    link: Locator::xpath(".//div[@class='mtm']//a"),
    theater_images: Locator::xpath(".//*[@rel = 'theater']"),
    more_images_badge: Locator::xpath(".//*[@class='_52db']"),
    thumbnails: GROUP_THUMBNAILS,
    comments: Locator::xpath(".//ul[@class='_7791']/li|.//ul[@class='_7791']/li/div/ul/li"),
    more_comments: Locator::xpath(".//*[contains(text(), 'more comments')]"),
    more_replies: Locator::xpath(
        ".//*[@data-testid = 'UFI2CommentsPagerRenderer/pager_depth_1' and @role = 'button']",
    ),
};

const PAGE_LOCATORS: LocatorSet = LocatorSet {
    entries: Locator::xpath(
        "//div[@id = 'pagelet_timeline_main_column']//div[@class = '_4-u2 _4-u8']",
    ),
    link: Locator::xpath(".//a[@class = '_52c6']"),
    thumbnails: PAGE_THUMBNAILS,
    ..GROUP_LOCATORS
};

impl FeedKind {
    /// Locator set for this kind
    pub fn locators(self) -> &'static LocatorSet {
        match self {
            FeedKind::Group => &GROUP_LOCATORS,
            FeedKind::Page => &PAGE_LOCATORS,
        }
    }

    /// Link detection differs between the two surfaces: groups announce a
    /// shared link in the post header, pages do not.
    pub fn link_policy(self) -> LinkPolicy {
        match self {
            FeedKind::Group => LinkPolicy::TextCue("shared a link"),
            FeedKind::Page => LinkPolicy::AlwaysLookup,
        }
    }

    /// Feed path relative to the site origin
    pub fn feed_path(self, id: &str) -> String {
        match self {
            FeedKind::Group => format!("groups/{}", id),
            FeedKind::Page => format!("{}/posts/", id),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Group => "group",
            FeedKind::Page => "page",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed to crawl, as supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub name: String,
    pub kind: FeedKind,
    pub id: String,
}

impl PageTarget {
    pub fn new(name: &str, kind: FeedKind, id: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            id: id.to_string(),
        }
    }

    /// Absolute feed URL under `base_url`
    pub fn url(&self, base_url: &url::Url) -> Result<url::Url, url::ParseError> {
        base_url.join(&self.kind.feed_path(&self.id))
    }
}
