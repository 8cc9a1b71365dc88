//! Bounded reload-until-ready loop for feed pages
//!
//! A feed page sometimes renders without any entries (rate limiting,
//! interstitials, slow scripts). The gate navigates again until the entry
//! container shows up, counting failed waits against a budget.

use crate::browser::{BrowserError, BrowserSession, Locator};
use crate::config::AttemptScope;
use crate::pacing::Pacing;
use crate::{FeedError, Result};

/// Counts failed feed loads against `max_attempts`
///
/// With [`AttemptScope::Session`] the count is shared by every load of the
/// harvest. With [`AttemptScope::Target`] it restarts at each target.
#[derive(Debug, Clone)]
pub struct RetryGate {
    max_attempts: u32,
    attempts: u32,
    scope: AttemptScope,
}

impl RetryGate {
    pub fn new(max_attempts: u32, scope: AttemptScope) -> Self {
        Self {
            max_attempts,
            attempts: 0,
            scope,
        }
    }

    /// Failed loads counted so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Called before each target; restarts the count for per-target scope
    pub fn begin_target(&mut self) {
        if self.scope == AttemptScope::Target {
            self.attempts = 0;
        }
    }

    /// Navigates to `url` until `ready` is present.
    ///
    /// # Arguments
    ///
    /// * `session` - Browser session to drive
    /// * `url` - Feed URL
    /// * `ready` - Locator that must match once the feed has rendered
    /// * `pacing` - Settle delay and wait timeout
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The feed is rendered and settled
    /// * `Err(FeedError::TooManyAttempts)` - The failed-load count went past
    ///   the budget; at most `max_attempts + 1` navigations are made
    /// * `Err(FeedError::Browser)` - Any failure other than a wait timeout
    pub async fn load<S>(
        &mut self,
        session: &S,
        url: &str,
        ready: &Locator,
        pacing: &Pacing,
    ) -> Result<()>
    where
        S: BrowserSession + ?Sized,
    {
        loop {
            if self.attempts > self.max_attempts {
                return Err(FeedError::TooManyAttempts {
                    url: url.to_string(),
                    attempts: self.attempts,
                });
            }

            session.navigate(url).await?;
            pacing.settle().await;

            match session.wait_until_present(ready, pacing.wait_timeout).await {
                Ok(_) => {
                    pacing.settle().await;
                    return Ok(());
                }
                Err(BrowserError::Timeout { .. }) => {
                    self.attempts += 1;
                    tracing::warn!(
                        "Feed at {} not ready (failed load {} of {} allowed), reloading",
                        url,
                        self.attempts,
                        self.max_attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
