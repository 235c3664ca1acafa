// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for the orchestration core.
//!
//! Used by unit tests and the integration suite; not part of the public
//! scraping API. Everything here runs without a browser endpoint.

use crate::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use crate::session::Session;
use anyhow::{bail, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// In-memory session stub that tracks lifecycle calls.
pub struct StubSession {
    pub connects: u32,
    pub invalidations: u32,
    pub disconnects: u32,
    pub alive: bool,
    /// When set, `ensure_connected` fails with this message.
    pub connect_error: Option<String>,
}

impl StubSession {
    pub fn new() -> Self {
        Self {
            connects: 0,
            invalidations: 0,
            disconnects: 0,
            alive: false,
            connect_error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            connect_error: Some(message.to_string()),
            ..Self::new()
        }
    }
}

impl Default for StubSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Session for StubSession {
    async fn ensure_connected(&mut self) -> Result<()> {
        if let Some(msg) = &self.connect_error {
            bail!("{msg}");
        }
        if !self.alive {
            self.connects += 1;
            self.alive = true;
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
        self.alive = false;
    }

    async fn disconnect(&mut self) {
        self.disconnects += 1;
        self.alive = false;
    }

    fn browser(&self) -> Result<&Browser> {
        bail!("stub session has no browser")
    }
}

/// Minimal record type for exercising the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRecord {
    pub key: String,
    pub category: Option<String>,
    pub website: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
}

impl StubRecord {
    pub fn success(key: &str, website: &str) -> Self {
        Self {
            key: key.to_string(),
            category: None,
            website: Some(website.to_string()),
            error: None,
            scraped_at: Utc::now(),
        }
    }

    pub fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            category: None,
            website: None,
            error: None,
            scraped_at: Utc::now(),
        }
    }
}

impl ScrapedRecord for StubRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn has_data(&self) -> bool {
        self.website.is_some()
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn failure(target: &Target, message: String) -> Self {
        Self {
            key: target.key.clone(),
            category: None,
            website: None,
            error: Some(message),
            scraped_at: Utc::now(),
        }
    }

    fn sort_key(&self) -> (String, String) {
        (
            self.category.clone().unwrap_or_default(),
            self.key.clone(),
        )
    }
}

enum CountingMode {
    /// Error `fail_times` attempts, then succeed.
    FailThenSucceed,
    /// Error on every attempt.
    AlwaysFail,
    /// Succeed with an empty payload on every attempt.
    AlwaysEmpty,
}

/// Fetcher that scripts a fixed failure pattern and counts attempts.
pub struct CountingFetcher {
    mode: CountingMode,
    fail_times: u32,
    message: String,
    attempts: AtomicU32,
}

impl CountingFetcher {
    pub fn fail_then_succeed(fail_times: u32) -> Self {
        Self {
            mode: CountingMode::FailThenSucceed,
            fail_times,
            message: "induced failure".to_string(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn fail_with_then_succeed(message: &str, fail_times: u32) -> Self {
        Self {
            mode: CountingMode::FailThenSucceed,
            fail_times,
            message: message.to_string(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn always_fail(message: &str) -> Self {
        Self {
            mode: CountingMode::AlwaysFail,
            fail_times: u32::MAX,
            message: message.to_string(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn always_empty() -> Self {
        Self {
            mode: CountingMode::AlwaysEmpty,
            fail_times: 0,
            message: String::new(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetFetcher for CountingFetcher {
    type Record = StubRecord;

    async fn fetch(&self, _cx: &mut FetchContext<'_>, target: &Target) -> Result<StubRecord> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        match self.mode {
            CountingMode::AlwaysEmpty => Ok(StubRecord::empty(&target.key)),
            CountingMode::AlwaysFail => bail!("{}", self.message),
            CountingMode::FailThenSucceed => {
                if attempt <= self.fail_times {
                    bail!("{}", self.message);
                }
                Ok(StubRecord::success(
                    &target.key,
                    &format!("https://{}.io", target.key),
                ))
            }
        }
    }
}

/// Per-key behavior for [`ScriptedFetcher`].
#[derive(Clone)]
pub enum Behavior {
    /// Succeed with the given website field.
    Succeed(String),
    /// Error with the given message for the first `n` attempts, then succeed.
    FailTimes(u32, String),
    /// Error with the given message on every attempt.
    AlwaysFail(String),
}

/// Fetcher with scripted per-target behavior, for end-to-end runs.
pub struct ScriptedFetcher {
    behaviors: HashMap<String, Behavior>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedFetcher {
    pub fn new(behaviors: HashMap<String, Behavior>) -> Self {
        Self {
            behaviors,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Total attempts made across all targets.
    pub fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }

    /// Attempts made for one target key.
    pub fn attempts_for(&self, key: &str) -> u32 {
        self.attempts.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TargetFetcher for ScriptedFetcher {
    type Record = StubRecord;

    async fn fetch(&self, _cx: &mut FetchContext<'_>, target: &Target) -> Result<StubRecord> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(target.key.clone()).or_insert(0);
            *n += 1;
            *n
        };

        match self.behaviors.get(&target.key) {
            None => Ok(StubRecord::empty(&target.key)),
            Some(Behavior::Succeed(website)) => Ok(StubRecord::success(&target.key, website)),
            Some(Behavior::AlwaysFail(msg)) => bail!("{msg}"),
            Some(Behavior::FailTimes(n, msg)) => {
                if attempt <= *n {
                    bail!("{msg}");
                }
                Ok(StubRecord::success(
                    &target.key,
                    &format!("https://{}.io", target.key),
                ))
            }
        }
    }
}
