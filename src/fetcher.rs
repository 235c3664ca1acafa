// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Target and record abstractions.
//!
//! The orchestration core is generic over these two seams: a
//! [`TargetFetcher`] knows how to turn one [`Target`] into one record,
//! and a [`ScrapedRecord`] exposes the identity, error, and ordering
//! hooks the retry/merge/persist machinery needs. Everything
//! page-specific (URL templates, in-page extraction) lives behind the
//! fetcher implementations in [`crate::domains`].

use crate::diagnostics::Diagnostics;
use crate::session::Session;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One unit of scrapable work.
///
/// Created once at orchestration start from an enumerated list and never
/// mutated. Identity is `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Stable identifier, unique within a run type.
    pub key: String,
    /// Fully resolved URL the fetcher should navigate to.
    pub url: String,
    /// Page number for paginated listings, where applicable.
    pub page: Option<u32>,
}

impl Target {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            page: None,
        }
    }

    pub fn with_page(key: impl Into<String>, url: impl Into<String>, page: u32) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            page: Some(page),
        }
    }
}

/// The structured outcome of processing one target.
///
/// Invariant: a record with `error() != None` carries no extracted
/// fields, only identity fields and the error description.
pub trait ScrapedRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Stable key matching the target that produced this record.
    fn key(&self) -> &str;

    /// Failure description, if the target could not be scraped.
    fn error(&self) -> Option<&str>;

    /// Whether at least one non-identity field was extracted.
    fn has_data(&self) -> bool;

    /// Set the error description on an already-built record. Used when an
    /// empty extraction is returned as success-with-empty-payload.
    fn set_error(&mut self, message: String);

    /// Build a failure record: identity fields populated, domain fields
    /// null, `error` set.
    fn failure(target: &Target, message: String) -> Self;

    /// Deterministic ordering key: group by primary category, then
    /// lexicographic by name. Types without a category use a single group
    /// and a key that preserves the intended order (e.g. zero-padded page
    /// numbers).
    fn sort_key(&self) -> (String, String) {
        (String::new(), self.key().to_string())
    }
}

/// Per-attempt context handed to a fetcher.
///
/// Exclusively owns the session borrow for the duration of one attempt;
/// `attempt` is 1-based so diagnostic artifacts can be keyed by it.
pub struct FetchContext<'a> {
    pub session: &'a mut dyn Session,
    pub attempt: u32,
    pub diagnostics: Option<&'a Diagnostics>,
}

/// An opaque fetch capability: open a tab, navigate, extract, close.
///
/// The core calls this under its retry/session/rate-limit policy and
/// never looks inside. Any error is retryable; whether an empty (but
/// successful) extraction is retried is decided by the configured
/// [`crate::config::EmptyPage`] policy.
#[async_trait]
pub trait TargetFetcher: Send + Sync {
    type Record: ScrapedRecord;

    async fn fetch(&self, cx: &mut FetchContext<'_>, target: &Target) -> Result<Self::Record>;
}
