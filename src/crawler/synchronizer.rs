//! Feed synchronization: turns one target's feed into an ordered record list
//!
//! Two traversals are supported:
//!
//! - **Bulk**: load once, scroll to the bottom, extract every entry.
//! - **Chunked**: extract `chunk_size` entries at a time and reload the page
//!   between chunks so the browser never holds the whole feed. After each
//!   reload the first post seen (the anchor) is located again and the next
//!   batch starts `consumed` entries after it.
//!
//! Both produce the same records for a feed that does not change while it is
//! being read.

use super::retry::RetryGate;
use super::scroll::ScrollDriver;
use crate::browser::{BrowserSession, Element};
use crate::config::Traversal;
use crate::extract::{extract_entry, read_raw_timestamp, CrawlIssues, ExtractContext};
use crate::feed::PostRecord;
use crate::state::{Anchor, ScrollState, SyncPhase};
use crate::{FeedError, Result};

/// Records gathered for one target, with the error that stopped it early
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub records: Vec<PostRecord>,
    pub failure: Option<FeedError>,
}

/// Position of the anchor within the traversal order
#[derive(Debug, Clone)]
struct AnchorMark {
    anchor: Anchor,
    /// Entries before the anchor on the first load
    shift: usize,
}

/// Drives one target's feed from first load to exhaustion
pub struct FeedSynchronizer<'a, S: ?Sized> {
    session: &'a S,
    url: &'a str,
    ctx: ExtractContext<'a>,
    driver: ScrollDriver,
    phase: SyncPhase,
}

impl<'a, S> FeedSynchronizer<'a, S>
where
    S: BrowserSession + ?Sized,
{
    pub fn new(session: &'a S, url: &'a str, ctx: ExtractContext<'a>) -> Self {
        Self {
            session,
            url,
            ctx,
            driver: ScrollDriver::new(*ctx.pacing, ctx.limits.max_scroll_depth),
            phase: SyncPhase::Loading,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Runs the configured traversal.
    ///
    /// Never loses records: when the traversal fails part way, everything
    /// extracted so far is returned alongside the failure.
    pub async fn run(&mut self, gate: &mut RetryGate, issues: &mut CrawlIssues) -> SyncOutcome {
        let mut records = Vec::new();
        self.phase = SyncPhase::Loading;
        let result = match self.ctx.limits.traversal {
            Traversal::Chunked => self.traverse_chunked(gate, issues, &mut records).await,
            Traversal::Bulk => self.traverse_bulk(gate, issues, &mut records).await,
        };
        SyncOutcome {
            records,
            failure: result.err(),
        }
    }

    fn enter(&mut self, next: SyncPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase change {} -> {}",
            self.phase,
            next
        );
        tracing::trace!("'{}': {} -> {}", self.ctx.page, self.phase, next);
        self.phase = next;
    }

    async fn traverse_bulk(
        &mut self,
        gate: &mut RetryGate,
        issues: &mut CrawlIssues,
        records: &mut Vec<PostRecord>,
    ) -> Result<()> {
        let locators = self.ctx.kind.locators();

        gate.load(self.session, self.url, &locators.entries, self.ctx.pacing)
            .await?;
        self.enter(SyncPhase::Scrolling);

        let mut scroll = ScrollState::new();
        self.driver.scroll_to_bottom(self.session, &mut scroll).await?;
        self.enter(SyncPhase::Extracting);

        let entries = self.session.find_all(None, &locators.entries).await?;
        tracing::info!(
            "'{}': extracting {} entries after {} scroll steps",
            self.ctx.page,
            entries.len(),
            scroll.steps
        );
        self.extract_batch(&entries, issues, records).await;

        self.enter(SyncPhase::Done);
        Ok(())
    }

    async fn traverse_chunked(
        &mut self,
        gate: &mut RetryGate,
        issues: &mut CrawlIssues,
        records: &mut Vec<PostRecord>,
    ) -> Result<()> {
        let locators = self.ctx.kind.locators();
        let chunk_size = self.ctx.limits.chunk_size;
        let margin = self.ctx.limits.chunk_margin;

        let mut scroll = ScrollState::new();
        let mut mark: Option<AnchorMark> = None;
        let mut consumed = 0usize;
        let mut base = 0usize;

        gate.load(self.session, self.url, &locators.entries, self.ctx.pacing)
            .await?;
        self.enter(SyncPhase::Scrolling);

        loop {
            // The anchor can move down on reload, so the target count is
            // recomputed from its new position until enough entries render
            let mut threshold = base + consumed + chunk_size + margin;
            let entries = loop {
                self.driver
                    .scroll_past(self.session, &locators.entries, threshold, &mut scroll)
                    .await?;
                let entries = self.session.find_all(None, &locators.entries).await?;

                let located = match &mark {
                    Some(mark) => Some(self.locate_anchor(&entries, mark).await?),
                    None => None,
                };
                base = match located {
                    Some(base) => base,
                    None => match self.place_anchor(&entries).await? {
                        Some(placed) => {
                            mark = Some(placed);
                            0
                        }
                        None => {
                            return self
                                .traverse_unanchored(issues, records, &mut scroll)
                                .await
                        }
                    },
                };

                let needed = base + consumed + chunk_size + margin;
                if entries.len() > needed || scroll.is_exhausted() {
                    break entries;
                }
                tracing::debug!(
                    "'{}': anchor at {}, scrolling on past {} entries",
                    self.ctx.page,
                    base,
                    needed
                );
                threshold = needed;
            };
            self.enter(SyncPhase::Extracting);

            let start = (base + consumed).min(entries.len());
            let end = if scroll.is_exhausted() {
                entries.len()
            } else {
                (start + chunk_size).min(entries.len())
            };
            let batch = &entries[start..end];

            if batch.is_empty() && !scroll.is_exhausted() {
                return Err(FeedError::Stalled {
                    target: self.ctx.page.to_string(),
                    offset: consumed,
                });
            }

            tracing::info!(
                "'{}': chunk of {} entries at offset {} ({} done)",
                self.ctx.page,
                batch.len(),
                consumed,
                records.len()
            );
            self.extract_batch(batch, issues, records).await;
            consumed += batch.len();

            if scroll.is_exhausted() {
                tracing::debug!("'{}': feed exhausted after {} entries", self.ctx.page, consumed);
                self.enter(SyncPhase::Done);
                return Ok(());
            }

            self.enter(SyncPhase::Resynchronizing);
            scroll.reset();
            gate.load(self.session, self.url, &locators.entries, self.ctx.pacing)
                .await?;
            self.enter(SyncPhase::Scrolling);
        }
    }

    /// Reads the first load to its end in one pass. Used when no entry carries
    /// a timestamp, since nothing could be found again after a reload.
    async fn traverse_unanchored(
        &mut self,
        issues: &mut CrawlIssues,
        records: &mut Vec<PostRecord>,
        scroll: &mut ScrollState,
    ) -> Result<()> {
        tracing::warn!(
            "'{}': no timestamped entry to anchor on, reading the feed without reloads",
            self.ctx.page
        );
        self.driver.scroll_to_bottom(self.session, scroll).await?;
        self.enter(SyncPhase::Extracting);

        let entries = self
            .session
            .find_all(None, &self.ctx.kind.locators().entries)
            .await?;
        self.extract_batch(&entries, issues, records).await;

        self.enter(SyncPhase::Done);
        Ok(())
    }

    /// Picks the anchor on the first load: the first entry with a timestamp
    async fn place_anchor(&self, entries: &[Element]) -> Result<Option<AnchorMark>> {
        for (shift, &entry) in entries.iter().enumerate() {
            if let Some(raw) = read_raw_timestamp(self.session, &self.ctx, entry).await? {
                tracing::debug!("'{}': anchored on {:?}", self.ctx.page, raw);
                return Ok(Some(AnchorMark {
                    anchor: Anchor::new(raw),
                    shift,
                }));
            }
        }
        Ok(None)
    }

    /// Index of the first traversal entry in a freshly loaded feed
    async fn locate_anchor(&self, entries: &[Element], mark: &AnchorMark) -> Result<usize> {
        tracing::debug!("'{}': locating anchor after reload", self.ctx.page);
        let mut markups = Vec::with_capacity(entries.len());
        for &entry in entries {
            markups.push(self.session.outer_html(entry).await?);
        }

        match mark.anchor.locate(markups.iter().map(String::as_str)) {
            Some(position) => Ok(position.saturating_sub(mark.shift)),
            None => Err(FeedError::AnchorNotFound {
                target: self.ctx.page.to_string(),
                anchor: mark.anchor.to_string(),
            }),
        }
    }

    async fn extract_batch(
        &self,
        batch: &[Element],
        issues: &mut CrawlIssues,
        records: &mut Vec<PostRecord>,
    ) {
        for &entry in batch {
            match extract_entry(self.session, &self.ctx, entry, issues).await {
                Ok(record) => records.push(record),
                Err(FeedError::MalformedEntry { reason }) => {
                    tracing::warn!("'{}': skipping entry: {}", self.ctx.page, reason);
                    issues.malformed_entries += 1;
                }
                Err(e) => {
                    tracing::warn!("'{}': failed to read entry: {}", self.ctx.page, e);
                    issues.failed_entries += 1;
                }
            }
        }
    }
}
