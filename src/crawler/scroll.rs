//! Scroll driver: grows the loaded feed by scrolling to the bottom

use crate::browser::{BrowserResult, BrowserSession, Locator, SCROLL_TO_BOTTOM};
use crate::pacing::Pacing;
use crate::state::ScrollState;

/// Scrolls the current page and records progress in a [`ScrollState`]
#[derive(Debug, Clone, Copy)]
pub struct ScrollDriver {
    pacing: Pacing,
    max_steps: Option<u32>,
}

impl ScrollDriver {
    pub fn new(pacing: Pacing, max_steps: Option<u32>) -> Self {
        Self { pacing, max_steps }
    }

    /// One scroll-to-bottom with size measurements on either side.
    /// Returns `true` once the pass is exhausted.
    async fn step<S>(&self, session: &S, state: &mut ScrollState) -> BrowserResult<bool>
    where
        S: BrowserSession + ?Sized,
    {
        let previous = session.rendered_size().await?;
        session.run_script(SCROLL_TO_BOTTOM, &[]).await?;
        self.pacing.after_scroll().await;
        let current = session.rendered_size().await?;

        if state.record_measurement(previous, current) {
            tracing::debug!("Feed stopped growing at {} bytes", current);
            return Ok(true);
        }
        if state.record_step(self.max_steps) {
            tracing::debug!("Scroll budget used up after {} steps", state.steps);
            return Ok(true);
        }
        Ok(false)
    }

    /// Scrolls until the rendered document stops growing or the step budget
    /// runs out.
    pub async fn scroll_to_bottom<S>(&self, session: &S, state: &mut ScrollState) -> BrowserResult<()>
    where
        S: BrowserSession + ?Sized,
    {
        while !self.step(session, state).await? {}
        Ok(())
    }

    /// Scrolls until more than `threshold` entries are rendered or the feed
    /// is exhausted.
    ///
    /// # Returns
    ///
    /// The number of entries rendered when scrolling stopped. The caller
    /// tells the two outcomes apart with [`ScrollState::is_exhausted`].
    pub async fn scroll_past<S>(
        &self,
        session: &S,
        entries: &Locator,
        threshold: usize,
        state: &mut ScrollState,
    ) -> BrowserResult<usize>
    where
        S: BrowserSession + ?Sized,
    {
        loop {
            let count = session.find_all(None, entries).await?.len();
            state.entries_seen = count;
            if count > threshold || state.is_exhausted() {
                return Ok(count);
            }
            self.step(session, state).await?;
        }
    }
}
