//! End-to-end harvest over a group and a page feed

use crate::fake_feed::{FakeFeed, FakeFrame, FakePost};
use crate::{create_test_config, group_entry, harvester, page_entry, GROUP_URL, PAGE_URL};
use feed_tide::config::{AttemptScope, LimitsConfig};
use feed_tide::crawler::select_targets;
use feed_tide::feed::{FeedKind, Media};
use feed_tide::output::{write_markdown_summary, SqliteSink};
use feed_tide::FeedError;
use std::path::Path;

fn two_feeds() -> FakeFeed {
    let group_posts = vec![
        FakePost::new("Ann Lee", "10/07/19, 8:15 AM").text("Just words today"),
        FakePost::new("Bob Ray", "10/06/19, 6:45 PM")
            .text("Look at this")
            .single_image(),
        FakePost::new("Cat Moss", "10/06/19, 9:05 AM")
            .header("Cat Moss shared a link.")
            .text("Worth a read")
            .link("https://example.com/article", true),
    ];

    let gallery: Vec<FakeFrame> = [
        "Saturday, October 5, 2019 at 1:30 PM",
        "Saturday, October 5, 2019 at 1:30 PM",
        "Saturday, October 5, 2019 at 1:30 PM",
        "Friday, October 4, 2019 at 7:00 PM",
    ]
    .iter()
    .map(|when| FakeFrame::new("Beta Page", when))
    .collect();
    let page_posts = vec![FakePost::new("Beta Page", "10/05/19, 1:30 PM")
        .text("Photos from the fair")
        .gallery(4, gallery)];

    FakeFeed::new(10)
        .with_feed(GROUP_URL, FeedKind::Group, group_posts)
        .with_feed(PAGE_URL, FeedKind::Page, page_posts)
}

#[tokio::test]
async fn test_two_target_harvest() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        dir.path(),
        Default::default(),
        vec![group_entry(), page_entry()],
    );
    let targets = select_targets(&config, None).unwrap();
    let mut harvester = harvester(two_feeds(), config);

    let reports = harvester.harvest_all(&targets).await;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_complete()));

    let records: Vec<_> = reports.iter().flat_map(|r| r.records.iter()).collect();
    assert_eq!(records.len(), 4);

    // Group: text only, single image, shared link
    assert_eq!(records[0].page, "Alpha");
    assert_eq!(records[0].media, Media::None);
    assert_eq!(records[0].link, None);

    assert!(matches!(records[1].media, Media::Inline(_)));
    assert_eq!(records[1].link, None);

    assert_eq!(records[2].link.as_deref(), Some("https://example.com/article"));
    assert_eq!(records[2].media, Media::None);

    // Page: gallery cut at the date change
    assert_eq!(records[3].page, "Beta");
    for slot in 0..3 {
        assert!(records[3].media.slot(slot).is_some(), "slot {} empty", slot);
    }
    assert!(records[3].media.slot(3).is_none());

    let images = dir.path().join("images");
    assert_eq!(std::fs::read_dir(&images).unwrap().count(), 4);
}

#[tokio::test]
async fn test_failed_target_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    let limits = LimitsConfig {
        max_attempts: 1,
        ..Default::default()
    };
    let mut config = create_test_config(dir.path(), limits, vec![group_entry(), page_entry()]);
    config.session.attempt_scope = AttemptScope::Target;
    let targets = select_targets(&config, None).unwrap();

    // Group feed never renders; the page feed is fine
    let feed = FakeFeed::new(10).with_feed(
        PAGE_URL,
        FeedKind::Page,
        vec![FakePost::new("Beta Page", "10/05/19, 1:30 PM")],
    );
    let mut harvester = harvester(feed, config);

    let reports = harvester.harvest_all(&targets).await;
    assert!(matches!(
        reports[0].failure,
        Some(FeedError::TooManyAttempts { .. })
    ));
    assert!(reports[0].records.is_empty());
    assert!(reports[1].is_complete());
    assert_eq!(reports[1].records.len(), 1);
}

#[tokio::test]
async fn test_run_writes_database_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        dir.path(),
        Default::default(),
        vec![group_entry(), page_entry()],
    );
    let targets = select_targets(&config, None).unwrap();
    let db_path = config.output.database_path.clone();
    let summary_path = config.output.summary_path.clone();

    let mut sink = SqliteSink::open(Path::new(&db_path)).unwrap();
    let mut harvester = harvester(two_feeds(), config);
    let stats = harvester.run(&targets, &mut sink, "test-hash").await.unwrap();

    assert_eq!(stats.total_records(), 4);
    assert_eq!(stats.total_images(), 4);
    assert_eq!(stats.failed_targets(), 0);

    let conn = sink.connection();
    let posts: i64 = conn
        .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
        .unwrap();
    let media: i64 = conn
        .query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))
        .unwrap();
    let status: String = conn
        .query_row("SELECT status FROM runs", [], |row| row.get(0))
        .unwrap();
    assert_eq!(posts, 4);
    assert_eq!(media, 4);
    assert_eq!(status, "completed");

    write_markdown_summary(&stats, Path::new(&summary_path)).unwrap();
    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("| Alpha | group | 3 |"));
    assert!(summary.contains("| Beta | page | 1 |"));
}
