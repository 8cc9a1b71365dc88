/// Scroll progress of the currently loaded feed
///
/// Owned by one synchronization pass and reset whenever the page is loaded
/// again. Only the scroll driver writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    /// Rendered document length after the last measurement
    pub last_rendered_size: usize,

    /// Entries present after the last count
    pub entries_seen: usize,

    /// Scroll steps taken since the last reset
    pub steps: u32,

    /// The configured scroll-step budget ran out before the feed stopped growing
    pub attempts_exhausted: bool,

    /// A scroll produced no new content
    pub end_of_feed_reached: bool,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all progress, as after a fresh page load
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a size measurement taken after a scroll.
    ///
    /// Returns `true` when the size is unchanged, which marks the end of the
    /// feed.
    pub fn record_measurement(&mut self, previous: usize, current: usize) -> bool {
        self.last_rendered_size = current;
        if current == previous {
            self.end_of_feed_reached = true;
        }
        self.end_of_feed_reached
    }

    /// Counts one scroll step against an optional budget.
    ///
    /// Returns `true` once the budget is used up.
    pub fn record_step(&mut self, max_steps: Option<u32>) -> bool {
        self.steps += 1;
        if let Some(max) = max_steps {
            if self.steps >= max {
                self.attempts_exhausted = true;
            }
        }
        self.attempts_exhausted
    }

    /// The feed will not grow any further in this pass
    pub fn is_exhausted(&self) -> bool {
        self.end_of_feed_reached || self.attempts_exhausted
    }
}
