//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `ScrollState`: growth and stagnation of the currently loaded feed
//! - `SyncPhase`: phase of the chunked feed synchronizer
//! - `Anchor`: marker used to find a known post again after a reload

mod scroll_state;
mod sync_state;

// Re-export main types
pub use scroll_state::ScrollState;
pub use sync_state::{Anchor, SyncPhase};
