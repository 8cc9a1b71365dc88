//! Run statistics collected while harvesting

use crate::extract::CrawlIssues;
use crate::feed::{FeedKind, Media, PostRecord};
use serde::Serialize;

/// Per-target counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetStatistics {
    pub name: String,
    pub kind: String,
    pub records: usize,
    pub unavailable: usize,
    pub comments: usize,
    /// Inline and gallery images
    pub images: usize,
    pub thumbnails: usize,
    /// Error that stopped the target, if any
    pub failure: Option<String>,
}

impl TargetStatistics {
    /// Counts the records of one target
    pub fn from_records(
        name: &str,
        kind: FeedKind,
        records: &[PostRecord],
        failure: Option<String>,
    ) -> Self {
        let mut stats = Self {
            name: name.to_string(),
            kind: kind.to_string(),
            records: records.len(),
            failure,
            ..Default::default()
        };

        for record in records {
            if record.unavailable {
                stats.unavailable += 1;
            }
            stats.comments += record.comments.len();
            match &record.media {
                Media::None => {}
                Media::Inline(_) => stats.images += 1,
                Media::Gallery(files) => stats.images += files.len(),
                Media::Thumbnail(_) => stats.thumbnails += 1,
            }
        }

        stats
    }
}

/// Statistics of one harvest run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub run_id: Option<i64>,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub targets: Vec<TargetStatistics>,
    pub issues: CrawlIssues,
}

impl RunStatistics {
    pub fn new(config_hash: &str) -> Self {
        Self {
            config_hash: config_hash.to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    pub fn add_target(&mut self, target: TargetStatistics) {
        self.targets.push(target);
    }

    /// Marks the run finished now
    pub fn finish(&mut self, issues: CrawlIssues) {
        self.issues = issues;
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    pub fn total_records(&self) -> usize {
        self.targets.iter().map(|t| t.records).sum()
    }

    pub fn total_images(&self) -> usize {
        self.targets.iter().map(|t| t.images).sum()
    }

    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.failure.is_some()).count()
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        let started = chrono::DateTime::parse_from_rfc3339(&self.started_at).ok()?;
        let finished = chrono::DateTime::parse_from_rfc3339(self.finished_at.as_ref()?).ok()?;
        Some((finished - started).num_seconds())
    }
}

/// Prints run statistics to stdout
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");
    println!("Records:        {}", stats.total_records());
    println!("Images saved:   {}", stats.total_images());
    println!(
        "Targets:        {} ({} failed)",
        stats.targets.len(),
        stats.failed_targets()
    );
    println!();

    for target in &stats.targets {
        match &target.failure {
            Some(reason) => println!(
                "  {:<24} {:>6} records  FAILED: {}",
                target.name, target.records, reason
            ),
            None => println!("  {:<24} {:>6} records", target.name, target.records),
        }
    }

    if stats.issues.total() > 0 {
        println!();
        println!("Issues:");
        println!("  Gallery open timeouts: {}", stats.issues.gallery_open_timeouts);
        println!("  Blocked clicks:        {}", stats.issues.blocked_clicks);
        println!("  Malformed entries:     {}", stats.issues.malformed_entries);
        println!("  Failed entries:        {}", stats.issues.failed_entries);
        println!("  Failed fields:         {}", stats.issues.failed_fields);
        println!("  Failed screenshots:    {}", stats.issues.failed_screenshots);
    }
}
