// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Incremental result persistence.
//!
//! One JSON document per run type holds `{ metadata, data }`. The same
//! file is both the final output artifact and the resumption cache: it is
//! rewritten after every unit of work (a partial save) so a crashed run
//! loses at most one target, and the write goes through a temp file plus
//! rename so a reader never sees a torn snapshot.

use crate::fetcher::ScrapedRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Run-level metadata persisted alongside the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// When this snapshot was generated.
    pub generated_at: DateTime<Utc>,
    /// Which run type produced it (e.g. "funds").
    pub source: String,
    /// Total records in `data`.
    pub total: usize,
    /// Records with no error.
    pub successful_scrapes: usize,
    /// Records with an error.
    pub failed_scrapes: usize,
    /// True while the run is still in progress.
    pub partial: bool,
    /// Elapsed run time at snapshot time.
    pub duration_ms: u64,
}

/// The full persisted collection: metadata plus one record per target key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet<R> {
    pub metadata: RunMetadata,
    pub data: Vec<R>,
}

/// Serialization and merge logic for one run type's result file.
pub struct IncrementalStore {
    path: PathBuf,
    source: String,
}

impl IncrementalStore {
    /// Store writing to `<dir>/<source>.json`.
    pub fn new(dir: &Path, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            path: dir.join(format!("{source}.json")),
            source,
        }
    }

    /// Path of the persisted file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load reusable records from the last persisted result set.
    ///
    /// Only records with no error and at least one populated field are
    /// eligible. A missing or unparseable file yields an empty map with a
    /// warning, never an error.
    pub fn load_cache<R: ScrapedRecord>(&self) -> HashMap<String, R> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no previous result file at {}", self.path.display());
                return HashMap::new();
            }
            Err(e) => {
                warn!("could not read {}: {e}", self.path.display());
                return HashMap::new();
            }
        };

        let set: ResultSet<R> = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "could not parse {}, starting fresh: {e}",
                    self.path.display()
                );
                return HashMap::new();
            }
        };

        let cache: HashMap<String, R> = set
            .data
            .into_iter()
            .filter(|r| r.error().is_none() && r.has_data())
            .map(|r| (r.key().to_string(), r))
            .collect();

        debug!(
            "loaded {} reusable records from {}",
            cache.len(),
            self.path.display()
        );
        cache
    }

    /// Merge new records over the cache. New records always win for a
    /// shared key; the result is deterministically ordered by each
    /// record's sort key.
    pub fn merge<R: ScrapedRecord>(cache: &HashMap<String, R>, new_records: &[R]) -> Vec<R> {
        let mut by_key: HashMap<String, R> = cache.clone();
        for record in new_records {
            by_key.insert(record.key().to_string(), record.clone());
        }

        let mut merged: Vec<R> = by_key.into_values().collect();
        merged.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        merged
    }

    /// Write a complete `{ metadata, data }` snapshot, replacing the
    /// previous file contents.
    ///
    /// Goes through a sibling temp file and an atomic rename so the file
    /// on disk is always a complete, valid result set.
    pub fn persist<R: ScrapedRecord>(
        &self,
        records: &[R],
        started_at: DateTime<Utc>,
        partial: bool,
    ) -> Result<()> {
        let failed = records.iter().filter(|r| r.error().is_some()).count();
        let metadata = RunMetadata {
            generated_at: Utc::now(),
            source: self.source.clone(),
            total: records.len(),
            successful_scrapes: records.len() - failed,
            failed_scrapes: failed,
            partial,
            duration_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
        };

        let set = ResultSet {
            metadata,
            data: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&set).context("failed to serialize result set")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        Ok(())
    }
}
