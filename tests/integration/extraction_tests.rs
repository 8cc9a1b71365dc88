//! Per-post extraction tests: media, galleries, comments, links

use crate::fake_feed::{FakeFeed, FakeFrame, FakePost};
use crate::{create_test_config, group_entry, harvester, page_entry, GROUP_URL, PAGE_URL};
use feed_tide::config::{LimitsConfig, TargetEntry};
use feed_tide::crawler::Harvester;
use feed_tide::feed::{FeedKind, Media, PageTarget, PostRecord};
use std::path::Path;
use tempfile::TempDir;

const SATURDAY: &str = "Saturday, October 5, 2019 at 1:30 PM";
const FRIDAY: &str = "Friday, October 4, 2019 at 9:00 AM";

fn frames(dates: &[&str]) -> Vec<FakeFrame> {
    dates
        .iter()
        .map(|when| FakeFrame::new("Jane Doe", when))
        .collect()
}

/// Harvests a single-post feed and returns the record with the harvester
async fn harvest_one(
    kind: FeedKind,
    post: FakePost,
    limits: LimitsConfig,
) -> (PostRecord, Harvester<FakeFeed>, TempDir) {
    harvest_post(kind, post, limits, false).await
}

async fn harvest_post(
    kind: FeedKind,
    post: FakePost,
    limits: LimitsConfig,
    hovers_fail: bool,
) -> (PostRecord, Harvester<FakeFeed>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let (url, entry): (&str, TargetEntry) = match kind {
        FeedKind::Group => (GROUP_URL, group_entry()),
        FeedKind::Page => (PAGE_URL, page_entry()),
    };
    let feed = FakeFeed::new(10).with_feed(url, kind, vec![post]);
    if hovers_fail {
        feed.fail_hovers();
    }
    let config = create_test_config(dir.path(), limits, vec![entry.clone()]);
    let mut harvester = harvester(feed, config);

    let mut report = harvester.harvest_target(&PageTarget::from(&entry)).await;
    assert!(report.is_complete(), "harvest failed: {:?}", report.failure);
    assert_eq!(report.records.len(), 1);
    let record = report.records.remove(0);
    (record, harvester, dir)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_text_post_fields() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").text("Morning walk");
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.author.as_deref(), Some("Ann Lee"));
    assert_eq!(
        record.timestamp.unwrap().format("%Y-%m-%d %H:%M").to_string(),
        "2019-10-05 13:30"
    );
    assert_eq!(record.text, "Morning walk");
    assert_eq!(record.page, "Alpha");
    assert!(!record.unavailable);
    assert!(record.comments.is_empty());
    assert_eq!(record.link, None);
    assert_eq!(record.media, Media::None);
}

#[tokio::test]
async fn test_author_fallback_chain() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").author_slot(2);
    let (record, _harvester, _dir) = harvest_one(FeedKind::Page, post, Default::default()).await;
    assert_eq!(record.author.as_deref(), Some("Ann Lee"));
}

#[tokio::test]
async fn test_unavailable_post_is_flagged() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").unavailable();
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;
    assert!(record.unavailable);
}

#[tokio::test]
async fn test_see_more_reveals_full_text() {
    let text = "A long story that the feed cuts off after a few words";
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .text(text)
        .truncated();
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;
    assert_eq!(record.text, text);
}

#[tokio::test]
async fn test_comments_expanded_and_normalized() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .comments(&["Bob Agreed", "Cat Same here", "Dan Third"], 2);
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;
    assert_eq!(record.comments, vec!["Bob Agreed", "Cat Same here", "Dan Third"]);
}

#[tokio::test]
async fn test_comments_truncated_to_limit() {
    let limits = LimitsConfig {
        max_comments: 2,
        ..Default::default()
    };
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .comments(&["Bob Agreed", "Cat Same here", "Dan Third"], 0);
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, limits).await;
    assert_eq!(record.comments, vec!["Bob Agreed", "Cat Same here"]);
}

#[tokio::test]
async fn test_group_link_needs_text_cue() {
    let without_cue =
        FakePost::new("Ann Lee", "10/05/19, 1:30 PM").link("https://example.com/a", true);
    let (record, _h, _d) = harvest_one(FeedKind::Group, without_cue, Default::default()).await;
    assert_eq!(record.link, None);

    let with_cue = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .header("Ann Lee shared a link.")
        .link("https://example.com/a", true);
    let (record, _h, _d) = harvest_one(FeedKind::Group, with_cue, Default::default()).await;
    assert_eq!(record.link.as_deref(), Some("https://example.com/a"));
}

#[tokio::test]
async fn test_page_link_read_only_when_displayed() {
    let shown = FakePost::new("Beta", "10/05/19, 1:30 PM").link("https://example.com/b", true);
    let (record, _h, _d) = harvest_one(FeedKind::Page, shown, Default::default()).await;
    assert_eq!(record.link.as_deref(), Some("https://example.com/b"));

    let hidden = FakePost::new("Beta", "10/05/19, 1:30 PM").link("https://example.com/b", false);
    let (record, _h, _d) = harvest_one(FeedKind::Page, hidden, Default::default()).await;
    assert_eq!(record.link, None);
}

#[tokio::test]
async fn test_single_image_is_screenshotted_inline() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").single_image();
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    match &record.media {
        Media::Inline(path) => {
            assert_eq!(file_name(path), "Ann_Lee_2019-10-05T13:30:00.png");
            assert!(path.exists());
        }
        other => panic!("expected inline image, got {:?}", other),
    }
    assert_eq!(harvester.session().escapes(), 0);
}

#[tokio::test]
async fn test_hidden_images_fall_back_to_thumbnail() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .gallery(2, frames(&[SATURDAY, SATURDAY]))
        .hidden_images()
        .thumbnail();
    let (record, _harvester, dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    match &record.media {
        Media::Thumbnail(path) => {
            assert!(path.starts_with(dir.path().join("thumbnails")));
            assert!(path.exists());
        }
        other => panic!("expected thumbnail, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gallery_stops_at_date_boundary() {
    let post = FakePost::new("Beta", "10/05/19, 1:30 PM")
        .gallery(4, frames(&[SATURDAY, SATURDAY, SATURDAY, FRIDAY]));
    let (record, harvester, _dir) = harvest_one(FeedKind::Page, post, Default::default()).await;

    let Media::Gallery(files) = &record.media else {
        panic!("expected gallery, got {:?}", record.media);
    };
    let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
    assert_eq!(
        names,
        vec![
            "Jane_Doe_2019-10-05T13:30:00_0.png",
            "Jane_Doe_2019-10-05T13:30:00_1.png",
            "Jane_Doe_2019-10-05T13:30:00_2.png",
        ]
    );
    assert!(files.iter().all(|p| p.exists()));
    assert!(record.media.slot(2).is_some());
    assert!(record.media.slot(3).is_none());

    assert_eq!(harvester.session().escapes(), 1);
    assert!(!harvester.session().lightbox_open());
}

#[tokio::test]
async fn test_gallery_visits_exactly_badge_count() {
    // "+2" over four thumbnails: five images, while Next keeps going
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .gallery(4, frames(&[SATURDAY; 7]))
        .badge("+2");
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    let Media::Gallery(files) = &record.media else {
        panic!("expected gallery, got {:?}", record.media);
    };
    assert_eq!(files.len(), 5);
    assert_eq!(harvester.session().screenshots(), 5);
    assert!(!harvester.session().lightbox_open());
}

#[tokio::test]
async fn test_gallery_respects_image_cap() {
    let limits = LimitsConfig {
        max_images: 2,
        ..Default::default()
    };
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").gallery(4, frames(&[SATURDAY; 4]));
    let (record, _harvester, _dir) = harvest_one(FeedKind::Group, post, limits).await;

    assert_eq!(record.media.items().len(), 2);
}

#[tokio::test]
async fn test_gallery_stops_without_next_control() {
    // Four thumbnails but the lightbox only has two frames
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM").gallery(4, frames(&[SATURDAY; 2]));
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.media.items().len(), 2);
    assert_eq!(harvester.session().escapes(), 1);
}

#[tokio::test]
async fn test_gallery_open_timeout_is_counted() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .gallery(3, frames(&[SATURDAY; 3]))
        .lightbox_never_opens();
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.media, Media::None);
    assert_eq!(harvester.issues().gallery_open_timeouts, 1);
    assert_eq!(harvester.session().escapes(), 1);
}

#[tokio::test]
async fn test_blocked_see_more_keeps_truncated_text() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .text("A long story that the feed cuts off after a few words")
        .truncated()
        .block_see_more();
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.text, "A long sto");
    assert_eq!(harvester.issues().blocked_clicks, 1);
    assert_eq!(harvester.issues().failed_fields, 0);
}

#[tokio::test]
async fn test_blocked_theater_image_opens_next_one() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .gallery(3, frames(&[SATURDAY; 3]))
        .block_theater(1);
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.media.items().len(), 3);
    assert_eq!(harvester.issues().blocked_clicks, 1);
    assert!(!harvester.session().lightbox_open());
}

#[tokio::test]
async fn test_all_theater_images_blocked() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .gallery(2, frames(&[SATURDAY; 2]))
        .block_theater(2);
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.media, Media::None);
    assert_eq!(harvester.issues().blocked_clicks, 2);
    assert_eq!(harvester.issues().gallery_open_timeouts, 0);
    assert_eq!(harvester.session().escapes(), 1);
}

#[tokio::test]
async fn test_blocked_more_comments_reads_loaded_comments() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .comments(&["Bob Agreed", "Cat Same here", "Dan Third"], 2)
        .block_more_comments();
    let (record, harvester, _dir) = harvest_one(FeedKind::Group, post, Default::default()).await;

    assert_eq!(record.comments, vec!["Bob Agreed"]);
    assert_eq!(harvester.issues().blocked_clicks, 1);
}

#[tokio::test]
async fn test_failed_link_read_keeps_record() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .header("Ann Lee shared a link.")
        .text("Worth a read")
        .link("https://example.com/a", true);
    let (record, harvester, _dir) =
        harvest_post(FeedKind::Group, post, Default::default(), true).await;

    assert_eq!(record.author.as_deref(), Some("Ann Lee"));
    assert_eq!(record.text, "Worth a read");
    assert_eq!(record.link, None);
    assert_eq!(harvester.issues().failed_fields, 1);
    assert_eq!(harvester.issues().failed_entries, 0);
}

#[tokio::test]
async fn test_failed_comment_expansion_keeps_other_fields() {
    let post = FakePost::new("Ann Lee", "10/05/19, 1:30 PM")
        .comments(&["Bob Agreed"], 0)
        .single_image();
    let (record, harvester, _dir) =
        harvest_post(FeedKind::Group, post, Default::default(), true).await;

    assert!(record.comments.is_empty());
    assert!(matches!(record.media, Media::Inline(_)));
    assert_eq!(harvester.issues().failed_fields, 1);
}
