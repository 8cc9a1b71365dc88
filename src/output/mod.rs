//! Output module for harvested records and run reports
//!
//! This module handles:
//! - Storing post records, comments and media paths in SQLite
//! - Collecting run statistics
//! - Writing the markdown run summary

mod markdown;
mod schema;
mod sqlite;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use sqlite::SqliteSink;
pub use stats::{print_statistics, RunStatistics, TargetStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};
