//! Crawler module for feed harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Bounded reloading until a feed renders
//! - Scroll-driven feed growth and end-of-feed detection
//! - Chunked and bulk feed synchronization
//! - Overall harvest coordination

mod coordinator;
mod retry;
mod scroll;
mod synchronizer;

pub use coordinator::{run_harvest, select_targets, Harvester, TargetReport};
pub use retry::RetryGate;
pub use scroll::ScrollDriver;
pub use synchronizer::{FeedSynchronizer, SyncOutcome};
