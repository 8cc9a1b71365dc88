//! Markdown run summary
//!
//! Writes a human-readable report of one harvest run: records per target,
//! targets that stopped early and the recoverable issues met along the way.

use crate::output::stats::RunStatistics;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run
///
/// # Arguments
///
/// * `stats` - Statistics of the finished run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_summary(stats: &RunStatistics, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats run statistics as markdown
pub fn format_markdown_summary(stats: &RunStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Feed-Tide Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    if let Some(run_id) = stats.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Started**: {}\n", stats.started_at));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", stats.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Records**: {}\n", stats.total_records()));
    md.push_str(&format!("- **Images Saved**: {}\n", stats.total_images()));
    md.push_str(&format!("- **Targets**: {}\n", stats.targets.len()));
    md.push_str(&format!(
        "- **Failed Targets**: {}\n\n",
        stats.failed_targets()
    ));

    if !stats.targets.is_empty() {
        md.push_str("## Targets\n\n");
        md.push_str("| Target | Kind | Records | Unavailable | Comments | Images | Thumbnails |\n");
        md.push_str("|--------|------|---------|-------------|----------|--------|------------|\n");
        for target in &stats.targets {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                target.name,
                target.kind,
                target.records,
                target.unavailable,
                target.comments,
                target.images,
                target.thumbnails
            ));
        }
        md.push('\n');
    }

    let failures: Vec<_> = stats
        .targets
        .iter()
        .filter_map(|t| t.failure.as_ref().map(|reason| (&t.name, reason)))
        .collect();
    if !failures.is_empty() {
        md.push_str("## Failures\n\n");
        for (name, reason) in failures {
            md.push_str(&format!("- **{}**: {}\n", name, reason));
        }
        md.push('\n');
    }

    if stats.issues.total() > 0 {
        let issues = &stats.issues;
        md.push_str("## Issues\n\n");
        md.push_str("| Issue | Count |\n");
        md.push_str("|-------|-------|\n");
        md.push_str(&format!(
            "| Gallery open timeouts | {} |\n",
            issues.gallery_open_timeouts
        ));
        md.push_str(&format!("| Blocked clicks | {} |\n", issues.blocked_clicks));
        md.push_str(&format!(
            "| Malformed entries | {} |\n",
            issues.malformed_entries
        ));
        md.push_str(&format!("| Failed entries | {} |\n", issues.failed_entries));
        md.push_str(&format!("| Failed fields | {} |\n", issues.failed_fields));
        md.push_str(&format!(
            "| Failed screenshots | {} |\n\n",
            issues.failed_screenshots
        ));
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Feed-Tide*\n");

    md
}
