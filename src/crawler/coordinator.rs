//! Harvest coordinator - runs every target through the feed synchronizer
//!
//! This module contains the top-level harvest loop:
//! - Preparing media folders and the record sink
//! - Harvesting each target in configuration order
//! - Persisting records and failures as each target completes
//! - Collecting run statistics and writing the summary

use super::retry::RetryGate;
use super::synchronizer::FeedSynchronizer;
use crate::browser::{BrowserSession, ChromiumSession};
use crate::config::Config;
use crate::extract::{CrawlIssues, ExtractContext, MediaFolders};
use crate::feed::{PageTarget, PostRecord};
use crate::output::{write_markdown_summary, RecordSink, RunStatistics, SqliteSink, TargetStatistics};
use crate::pacing::Pacing;
use crate::{ConfigError, FeedError, Result};
use std::path::Path;
use url::Url;

/// Outcome of harvesting one target
#[derive(Debug)]
pub struct TargetReport {
    pub target: PageTarget,
    /// Records in traversal order, including those gathered before a failure
    pub records: Vec<PostRecord>,
    /// Error that stopped the target early
    pub failure: Option<FeedError>,
}

impl TargetReport {
    fn failed(target: &PageTarget, failure: FeedError) -> Self {
        Self {
            target: target.clone(),
            records: Vec::new(),
            failure: Some(failure),
        }
    }

    /// True when the feed was read to its end
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn statistics(&self) -> TargetStatistics {
        TargetStatistics::from_records(
            &self.target.name,
            self.target.kind,
            &self.records,
            self.failure.as_ref().map(|e| e.to_string()),
        )
    }
}

/// Resolves the configured targets, optionally narrowed to one name
pub fn select_targets(config: &Config, only: Option<&str>) -> Result<Vec<PageTarget>> {
    let targets: Vec<PageTarget> = config
        .targets
        .iter()
        .filter(|t| only.map_or(true, |name| t.name == name))
        .map(PageTarget::from)
        .collect();

    if targets.is_empty() {
        if let Some(name) = only {
            return Err(ConfigError::Validation(format!("No target named '{}'", name)).into());
        }
    }
    Ok(targets)
}

/// Main harvest coordinator
///
/// Owns the browser session for the whole run. Targets are harvested one
/// after another on that session.
pub struct Harvester<S> {
    session: S,
    config: Config,
    base_url: Url,
    pacing: Pacing,
    folders: MediaFolders,
    gate: RetryGate,
    issues: CrawlIssues,
}

impl<S> Harvester<S>
where
    S: BrowserSession,
{
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `session` - Browser session to drive
    /// * `config` - Validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Media folders exist and the base URL is usable
    /// * `Err(FeedError)` - Invalid base URL or folders could not be created
    pub fn new(session: S, config: Config) -> Result<Self> {
        let base_url = Url::parse(&config.session.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.session.base_url, e)))?;

        let folders = MediaFolders::from_config(&config.output);
        folders.create()?;

        Ok(Self {
            pacing: Pacing::from_config(&config.session),
            gate: RetryGate::new(config.limits.max_attempts, config.session.attempt_scope),
            issues: CrawlIssues::default(),
            session,
            config,
            base_url,
            folders,
        })
    }

    /// Replaces the delays derived from configuration
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn issues(&self) -> CrawlIssues {
        self.issues
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Harvests one target. Never fails: errors end up in the report.
    pub async fn harvest_target(&mut self, target: &PageTarget) -> TargetReport {
        self.gate.begin_target();

        let url = match target.url(&self.base_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                let error = ConfigError::InvalidUrl(format!("{}: {}", target.id, e));
                return TargetReport::failed(target, error.into());
            }
        };
        tracing::info!("Harvesting {} '{}' from {}", target.kind, target.name, url);

        let ctx = ExtractContext {
            kind: target.kind,
            page: &target.name,
            limits: &self.config.limits,
            pacing: &self.pacing,
            folders: &self.folders,
        };
        let mut synchronizer = FeedSynchronizer::new(&self.session, &url, ctx);
        let outcome = synchronizer.run(&mut self.gate, &mut self.issues).await;

        TargetReport {
            target: target.clone(),
            records: outcome.records,
            failure: outcome.failure,
        }
    }

    /// Harvests `targets` in order, continuing past failed targets
    pub async fn harvest_all(&mut self, targets: &[PageTarget]) -> Vec<TargetReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let report = self.harvest_target(target).await;
            log_report(&report);
            reports.push(report);
        }
        reports
    }

    /// Runs a full harvest into `sink`
    ///
    /// Records of each target are written as soon as the target finishes, so
    /// a crash later in the run keeps earlier targets.
    ///
    /// # Returns
    ///
    /// * `Ok(RunStatistics)` - Harvest finished; individual targets may have failed
    /// * `Err(FeedError)` - The sink could not be written
    pub async fn run(
        &mut self,
        targets: &[PageTarget],
        sink: &mut dyn RecordSink,
        config_hash: &str,
    ) -> Result<RunStatistics> {
        let mut stats = RunStatistics::new(config_hash);
        let run_id = sink.begin_run(config_hash)?;
        stats.run_id = Some(run_id);
        tracing::info!("Starting harvest run {} over {} targets", run_id, targets.len());
        let start_time = std::time::Instant::now();

        for target in targets {
            let report = self.harvest_target(target).await;
            log_report(&report);

            for record in &report.records {
                sink.record_post(record)?;
            }
            if let Some(failure) = &report.failure {
                sink.record_failure(&target.name, &failure.to_string())?;
            }
            stats.add_target(report.statistics());
        }

        stats.finish(self.issues);
        sink.finish_run(&stats)?;

        tracing::info!(
            "Harvest completed: {} records from {} targets in {:?}",
            stats.total_records(),
            targets.len(),
            start_time.elapsed()
        );
        Ok(stats)
    }
}

fn log_report(report: &TargetReport) {
    match &report.failure {
        None => tracing::info!(
            "'{}': {} records",
            report.target.name,
            report.records.len()
        ),
        Some(e) => tracing::error!(
            "'{}' stopped after {} records: {}",
            report.target.name,
            report.records.len(),
            e
        ),
    }
}

/// Runs a complete harvest with a Chromium session
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `config_hash` - Hash recorded with the run
/// * `only` - Restrict the run to the target with this name
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Harvest finished and the summary was written
/// * `Err(FeedError)` - Setup failed or output could not be written
pub async fn run_harvest(
    config: Config,
    config_hash: &str,
    only: Option<&str>,
) -> Result<RunStatistics> {
    let targets = select_targets(&config, only)?;
    let mut sink = SqliteSink::open(Path::new(&config.output.database_path))?;
    let summary_path = config.output.summary_path.clone();

    let session = ChromiumSession::launch(&config.browser).await?;
    let mut harvester = Harvester::new(session, config)?;

    let result = harvester.run(&targets, &mut sink, config_hash).await;

    if let Err(e) = harvester.into_session().shutdown().await {
        tracing::warn!("Browser did not shut down cleanly: {}", e);
    }

    let stats = result?;
    write_markdown_summary(&stats, Path::new(&summary_path))?;
    tracing::info!("Summary written to {}", summary_path);
    Ok(stats)
}
