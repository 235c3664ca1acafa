// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run sequencing: enumerate, skip cached, fetch with retry, persist,
//! throttle, finalize.
//!
//! One orchestrator instance drives one run. Targets are processed
//! strictly one at a time; the only shared resource is the single
//! session handle, owned by whichever fetch attempt is executing.
//! Incremental persistence after every unit bounds redo work on a crash
//! to at most one target.

use crate::diagnostics::Diagnostics;
use crate::error::ScrapeError;
use crate::fetcher::{ScrapedRecord, Target, TargetFetcher};
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::store::IncrementalStore;
use crate::throttle::Throttle;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// End-of-run accounting.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique targets submitted.
    pub total_targets: usize,
    /// Targets skipped because the cache already had a usable record.
    pub skipped_cached: usize,
    /// Targets actually fetched this run.
    pub fetched: usize,
    /// Records without an error in the final result set.
    pub successful: usize,
    /// Records with an error in the final result set.
    pub failed: usize,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Where the final result set was written.
    pub output_path: PathBuf,
}

/// Sequences one scraping run over a session, fetcher, and store.
pub struct Orchestrator<S: Session, F: TargetFetcher> {
    session: S,
    fetcher: F,
    store: IncrementalStore,
    retry: RetryPolicy,
    throttle: Throttle,
    diagnostics: Option<Diagnostics>,
    /// Ignore the cache and refetch every target.
    fresh: bool,
}

impl<S: Session, F: TargetFetcher> Orchestrator<S, F> {
    pub fn new(
        session: S,
        fetcher: F,
        store: IncrementalStore,
        retry: RetryPolicy,
        throttle: Throttle,
    ) -> Self {
        Self {
            session,
            fetcher,
            store,
            retry,
            throttle,
            diagnostics: None,
            fresh: false,
        }
    }

    /// Enable per-attempt screenshot diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Ignore any previously cached records and refetch everything.
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// The fetcher driving this run.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run the full sequence over `targets` and return the summary.
    ///
    /// A failure to establish the very first connection aborts the run
    /// with [`ScrapeError::FatalStartup`]; an individual target
    /// exhausting its retries is recorded as a failed record and the run
    /// continues. Partial persist failures are logged and ignored; a
    /// failed final persist is [`ScrapeError::FinalPersist`].
    pub async fn run(&mut self, targets: &[Target]) -> Result<RunSummary, ScrapeError> {
        let started_at = Utc::now();

        let cache = if self.fresh {
            Default::default()
        } else {
            self.store.load_cache::<F::Record>()
        };

        let remaining: Vec<&Target> = targets
            .iter()
            .filter(|t| !cache.contains_key(&t.key))
            .collect();
        let skipped = targets.len() - remaining.len();

        info!(
            total = targets.len(),
            cached = skipped,
            to_fetch = remaining.len(),
            "starting run"
        );

        if !remaining.is_empty() {
            self.session
                .ensure_connected()
                .await
                .map_err(ScrapeError::FatalStartup)?;
        }

        let mut new_records: Vec<F::Record> = Vec::with_capacity(remaining.len());

        for (i, target) in remaining.iter().enumerate() {
            let record = self
                .retry
                .execute(
                    &mut self.session,
                    &self.fetcher,
                    target,
                    self.diagnostics.as_ref(),
                )
                .await;

            match record.error() {
                None => info!(
                    "[{}/{}] {} OK",
                    i + 1,
                    remaining.len(),
                    target.key
                ),
                Some(reason) => info!(
                    "[{}/{}] {} FAILED: {reason}",
                    i + 1,
                    remaining.len(),
                    target.key
                ),
            }

            new_records.push(record);

            // Partial save after every unit so a crash loses at most one
            // target's work. A transient write failure must not block the
            // scraping loop.
            let merged = IncrementalStore::merge(&cache, &new_records);
            if let Err(e) = self.store.persist(&merged, started_at, true) {
                warn!("partial persist failed (continuing): {e:#}");
            }

            if i + 1 < remaining.len() {
                self.throttle.wait().await;
            }
        }

        self.session.disconnect().await;

        let merged = IncrementalStore::merge(&cache, &new_records);
        self.store
            .persist(&merged, started_at, false)
            .map_err(ScrapeError::FinalPersist)?;

        let failed = merged.iter().filter(|r| r.error().is_some()).count();
        let summary = RunSummary {
            total_targets: targets.len(),
            skipped_cached: skipped,
            fetched: remaining.len(),
            successful: merged.len() - failed,
            failed,
            duration_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
            output_path: self.store.path().to_path_buf(),
        };

        info!(
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped_cached,
            duration_ms = summary.duration_ms,
            "run complete"
        );

        Ok(summary)
    }
}
