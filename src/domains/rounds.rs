// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Paginated funding-rounds table pages.
//!
//! One target per listing page; the record carries every round row the
//! page yielded. Keys are zero-padded (`page-0003`) so lexicographic
//! ordering matches page order. Probing past the last known page should
//! run under [`crate::config::EmptyPage::Accept`], since a legitimately
//! empty final page is expected there.

use super::{close_page, extract_json, load_page, outcome_of, PagePolicy};
use crate::diagnostics::Outcome;
use crate::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const READY_SELECTOR: &str = ".rounds-table, table tbody tr";

const EXTRACT_SCRIPT: &str = r#"
(() => {
    const rows = Array.from(
        document.querySelectorAll('.rounds-table tbody tr, table.funding-rounds tbody tr')
    );
    return rows.map((row) => {
        const cells = Array.from(row.querySelectorAll('td'));
        const cell = (i) => (cells[i] && cells[i].textContent.trim()) || null;
        const link = row.querySelector('td a');
        return {
            project: cell(0),
            projectUrl: link ? link.href : null,
            date: cell(1),
            amount: cell(2),
            stage: cell(3),
            investors: (cell(4) || '').split(',').map((s) => s.trim()).filter(Boolean),
        };
    });
})()
"#;

/// One funding round row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRound {
    pub project: Option<String>,
    pub project_url: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub stage: Option<String>,
    #[serde(default)]
    pub investors: Vec<String>,
}

/// All rounds extracted from one listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundsPageRecord {
    /// `page-NNNN`, zero-padded for stable ordering.
    pub key: String,
    pub page: u32,
    #[serde(default)]
    pub rounds: Vec<FundingRound>,
    pub error: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedRecord for RoundsPageRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn has_data(&self) -> bool {
        !self.rounds.is_empty()
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn failure(target: &Target, message: String) -> Self {
        Self {
            key: target.key.clone(),
            page: target.page.unwrap_or(0),
            rounds: Vec::new(),
            error: Some(message),
            scraped_at: Utc::now(),
        }
    }
}

/// Fetcher for funding-round listing pages.
pub struct RoundsFetcher {
    base_url: String,
    policy: PagePolicy,
}

impl RoundsFetcher {
    pub fn new(base_url: impl Into<String>, policy: PagePolicy) -> Self {
        Self {
            base_url: base_url.into(),
            policy,
        }
    }

    /// Target for one listing page (1-based).
    pub fn target_for(&self, page: u32) -> Target {
        Target::with_page(
            format!("page-{page:04}"),
            format!(
                "{}/funding-rounds/?page={page}",
                self.base_url.trim_end_matches('/')
            ),
            page,
        )
    }

    /// Targets for pages `1..=count`.
    pub fn targets(&self, count: u32) -> Vec<Target> {
        (1..=count).map(|p| self.target_for(p)).collect()
    }
}

#[async_trait]
impl TargetFetcher for RoundsFetcher {
    type Record = RoundsPageRecord;

    async fn fetch(&self, cx: &mut FetchContext<'_>, target: &Target) -> Result<RoundsPageRecord> {
        let page = load_page(cx, &target.url, READY_SELECTOR, &self.policy).await?;

        let value = match extract_json(&page, EXTRACT_SCRIPT).await {
            Ok(v) => v,
            Err(e) => {
                close_page(cx, page, &target.key, Outcome::Error).await;
                return Err(e);
            }
        };

        let rounds: Vec<FundingRound> = serde_json::from_value(value).unwrap_or_default();

        let record = RoundsPageRecord {
            key: target.key.clone(),
            page: target.page.unwrap_or(0),
            rounds,
            error: None,
            scraped_at: Utc::now(),
        };

        close_page(cx, page, &target.key, outcome_of(record.has_data())).await;
        Ok(record)
    }
}
