//! Parsing of the two timestamp formats the feed renders

use chrono::NaiveDateTime;

/// `title` attribute of a post's time element, e.g. `10/05/19, 1:30 PM`
pub const POST_TIMESTAMP_FORMAT: &str = "%m/%d/%y, %I:%M %p";

/// Lightbox frame time, e.g. `Saturday, October 5, 2019 at 1:30 PM`
pub const LIGHTBOX_TIMESTAMP_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

pub fn parse_post_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), POST_TIMESTAMP_FORMAT).ok()
}

pub fn parse_lightbox_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), LIGHTBOX_TIMESTAMP_FORMAT).ok()
}

/// ISO-8601 form used in media file names
pub fn iso(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
}
