// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end orchestration runs over stub sessions and scripted
//! fetchers. No browser endpoint is involved; these exercise the
//! retry/cache/persist/throttle sequencing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use fundlens::config::EmptyPage;
use fundlens::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use fundlens::orchestrator::Orchestrator;
use fundlens::retry::RetryPolicy;
use fundlens::store::{IncrementalStore, ResultSet};
use fundlens::testutil::{Behavior, ScriptedFetcher, StubRecord, StubSession};
use fundlens::throttle::Throttle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        retry_delay: Duration::ZERO,
        empty_page: EmptyPage::Retry,
    }
}

fn read_result_set(path: &Path) -> ResultSet<StubRecord> {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn end_to_end_two_targets_one_fails() {
    // Upstream lists a and b; a succeeds, b times out on all 3 attempts.
    let dir = tempfile::tempdir().unwrap();
    let mut behaviors = HashMap::new();
    behaviors.insert("a".to_string(), Behavior::Succeed("https://a.io".into()));
    behaviors.insert("b".to_string(), Behavior::AlwaysFail("timeout".into()));

    let fetcher = ScriptedFetcher::new(behaviors);
    let store = IncrementalStore::new(dir.path(), "funds");
    let output_path = store.path().to_path_buf();

    let mut orch = Orchestrator::new(
        StubSession::new(),
        fetcher,
        store,
        retry(3),
        Throttle::new(Duration::ZERO),
    );

    let targets = vec![
        Target::new("a", "https://site/funds/a/"),
        Target::new("b", "https://site/funds/b/"),
    ];
    let summary = orch.run(&targets).await.unwrap();

    assert_eq!(summary.total_targets, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 1);

    let set = read_result_set(&output_path);
    assert_eq!(set.data.len(), 2);
    assert_eq!(set.metadata.successful_scrapes, 1);
    assert_eq!(set.metadata.failed_scrapes, 1);
    assert!(!set.metadata.partial);

    let a = set.data.iter().find(|r| r.key() == "a").unwrap();
    assert_eq!(a.website.as_deref(), Some("https://a.io"));
    assert!(a.error().is_none());

    let b = set.data.iter().find(|r| r.key() == "b").unwrap();
    assert_eq!(b.error(), Some("timeout"));
    assert!(b.website.is_none());
}

#[tokio::test]
async fn record_count_matches_unique_target_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut behaviors = HashMap::new();
    for key in ["a", "b", "c"] {
        behaviors.insert(
            key.to_string(),
            Behavior::Succeed(format!("https://{key}.io")),
        );
    }

    let store = IncrementalStore::new(dir.path(), "funds");
    let output_path = store.path().to_path_buf();
    let mut orch = Orchestrator::new(
        StubSession::new(),
        ScriptedFetcher::new(behaviors),
        store,
        retry(1),
        Throttle::new(Duration::ZERO),
    );

    // "a" submitted twice; the result set must still hold one record per key.
    let targets = vec![
        Target::new("a", "u"),
        Target::new("b", "u"),
        Target::new("a", "u"),
        Target::new("c", "u"),
    ];
    orch.run(&targets).await.unwrap();

    let set = read_result_set(&output_path);
    assert_eq!(set.data.len(), 3);
}

#[tokio::test]
async fn second_run_over_successful_result_fetches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let targets = vec![Target::new("a", "u"), Target::new("b", "u")];

    let mut behaviors = HashMap::new();
    behaviors.insert("a".to_string(), Behavior::Succeed("https://a.io".into()));
    behaviors.insert("b".to_string(), Behavior::Succeed("https://b.io".into()));

    let store = IncrementalStore::new(dir.path(), "funds");
    let output_path = store.path().to_path_buf();
    let mut first = Orchestrator::new(
        StubSession::new(),
        ScriptedFetcher::new(behaviors.clone()),
        store,
        retry(3),
        Throttle::new(Duration::ZERO),
    );
    first.run(&targets).await.unwrap();
    let first_set = read_result_set(&output_path);

    // Second run: the session stub errors on connect, proving the browser
    // endpoint is never contacted when everything is cached.
    let fetcher = ScriptedFetcher::new(behaviors);
    let mut second = Orchestrator::new(
        StubSession::failing("must not connect"),
        fetcher,
        IncrementalStore::new(dir.path(), "funds"),
        retry(3),
        Throttle::new(Duration::ZERO),
    );
    let summary = second.run(&targets).await.unwrap();

    assert_eq!(summary.skipped_cached, 2);
    assert_eq!(summary.fetched, 0);

    let second_set = read_result_set(&output_path);
    // Identical data; only run metadata may differ.
    assert_eq!(
        serde_json::to_value(&first_set.data).unwrap(),
        serde_json::to_value(&second_set.data).unwrap()
    );
}

#[tokio::test]
async fn failed_cached_record_is_refetched_and_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(dir.path(), "funds");
    let output_path = store.path().to_path_buf();

    // Prior run left k as a failure; failures are not cache-eligible.
    let prior = vec![StubRecord::failure(
        &Target::new("k", "u"),
        "timeout".to_string(),
    )];
    store.persist(&prior, Utc::now(), false).unwrap();

    let mut behaviors = HashMap::new();
    behaviors.insert("k".to_string(), Behavior::Succeed("https://new.io".into()));
    let mut orch = Orchestrator::new(
        StubSession::new(),
        ScriptedFetcher::new(behaviors),
        store,
        retry(1),
        Throttle::new(Duration::ZERO),
    );
    orch.run(&[Target::new("k", "u")]).await.unwrap();

    let set = read_result_set(&output_path);
    assert_eq!(set.data.len(), 1);
    assert_eq!(set.data[0].website.as_deref(), Some("https://new.io"));
    assert!(set.data[0].error().is_none());
}

/// Fetcher whose second target inspects the file persisted after the
/// first unit, standing in for a reader after a mid-run crash.
struct PartialFileProbe {
    output_path: std::path::PathBuf,
    observed: Mutex<Option<ResultSet<StubRecord>>>,
}

#[async_trait]
impl TargetFetcher for PartialFileProbe {
    type Record = StubRecord;

    async fn fetch(&self, _cx: &mut FetchContext<'_>, target: &Target) -> Result<StubRecord> {
        if target.key == "second" {
            let content = std::fs::read_to_string(&self.output_path)?;
            let set: ResultSet<StubRecord> = serde_json::from_str(&content)?;
            *self.observed.lock().unwrap() = Some(set);
        }
        Ok(StubRecord::success(&target.key, "https://x.io"))
    }
}

#[tokio::test]
async fn partial_save_leaves_complete_snapshot_between_units() {
    let dir = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(dir.path(), "funds");
    let probe = PartialFileProbe {
        output_path: store.path().to_path_buf(),
        observed: Mutex::new(None),
    };

    let mut orch = Orchestrator::new(
        StubSession::new(),
        probe,
        store,
        retry(1),
        Throttle::new(Duration::ZERO),
    );
    orch.run(&[Target::new("first", "u"), Target::new("second", "u")])
        .await
        .unwrap();

    // The snapshot seen between units: one completed record, partial flag set.
    let observed = orch.fetcher().observed.lock().unwrap().take().unwrap();
    assert_eq!(observed.data.len(), 1);
    assert_eq!(observed.data[0].key(), "first");
    assert!(observed.metadata.partial);
}

/// Fetcher recording the start instant of every fetch.
struct TimingFetcher {
    starts: Mutex<Vec<Instant>>,
}

#[async_trait]
impl TargetFetcher for TimingFetcher {
    type Record = StubRecord;

    async fn fetch(&self, _cx: &mut FetchContext<'_>, target: &Target) -> Result<StubRecord> {
        self.starts.lock().unwrap().push(Instant::now());
        Ok(StubRecord::success(&target.key, "https://x.io"))
    }
}

#[tokio::test]
async fn throttle_spaces_fetch_starts() {
    let dir = tempfile::tempdir().unwrap();
    let delay = Duration::from_millis(40);
    let fetcher = TimingFetcher {
        starts: Mutex::new(Vec::new()),
    };

    let mut orch = Orchestrator::new(
        StubSession::new(),
        fetcher,
        IncrementalStore::new(dir.path(), "funds"),
        retry(1),
        Throttle::new(delay),
    );

    let targets: Vec<Target> = (0..3)
        .map(|i| Target::new(format!("t{i}"), "u"))
        .collect();
    orch.run(&targets).await.unwrap();

    let starts = orch.fetcher().starts.lock().unwrap().clone();
    assert_eq!(starts.len(), 3);
    // Fetches never overlap (sequential) and at least (K-1) * delay
    // elapses between the first and last fetch start.
    assert!(starts.windows(2).all(|w| w[1] >= w[0]));
    assert!(starts[2].duration_since(starts[0]) >= 2 * delay);
}
