//! Randomized delays between browser actions
//!
//! Every navigation, scroll and click is followed by a pause of the base delay
//! plus up to 10% jitter, so renders finish before they are read and the
//! action rhythm is not perfectly regular.

use crate::config::SessionConfig;
use rand::Rng;
use std::time::Duration;

/// Upper bound of the random extra delay, as a fraction of the base delay
pub const JITTER_RATIO: f64 = 0.1;

/// Delays and timeouts for one harvest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    /// Presence waits for the feed and the lightbox
    pub wait_timeout: Duration,
    /// After navigation and after the feed appears
    pub settle: Duration,
    /// After each scroll-to-bottom
    pub scroll: Duration,
    /// After clicks and hovers
    pub action: Duration,
}

impl Pacing {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
            settle: Duration::from_millis(config.settle_delay_ms),
            scroll: Duration::from_millis(config.scroll_delay_ms),
            action: Duration::from_millis(config.action_delay_ms),
        }
    }

    /// No delays at all, only a short wait timeout
    pub fn immediate() -> Self {
        Self {
            wait_timeout: Duration::from_millis(100),
            settle: Duration::ZERO,
            scroll: Duration::ZERO,
            action: Duration::ZERO,
        }
    }

    pub async fn settle(&self) {
        jittered_sleep(self.settle).await;
    }

    pub async fn after_scroll(&self) {
        jittered_sleep(self.scroll).await;
    }

    pub async fn after_action(&self) {
        jittered_sleep(self.action).await;
    }
}

/// Base delay plus a random extra of up to [`JITTER_RATIO`]
pub fn jittered(base: Duration) -> Duration {
    let fraction = rand::thread_rng().gen_range(0.0..=JITTER_RATIO);
    base + base.mul_f64(fraction)
}

pub async fn jittered_sleep(base: Duration) {
    if base.is_zero() {
        return;
    }
    let delay = jittered(base);
    tokio::time::sleep(delay).await;
}
