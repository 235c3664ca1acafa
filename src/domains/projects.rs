// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Project detail pages.

use super::{close_page, extract_json, load_page, outcome_of, PagePolicy};
use crate::diagnostics::Outcome;
use crate::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const READY_SELECTOR: &str = ".project-page, main h1";

const EXTRACT_SCRIPT: &str = r#"
(() => {
    const text = (sel) => {
        const el = document.querySelector(sel);
        return el && el.textContent.trim() ? el.textContent.trim() : null;
    };
    const website = (() => {
        const a = document.querySelector('.project-links a.website, a[data-role="website"]');
        return a ? a.href : null;
    })();
    return {
        name: text('.project-page h1, main h1'),
        description: text('.project-description, .project-about p'),
        website: website,
        totalRaised: text('.total-raised .value, .funding-total'),
        categories: Array.from(document.querySelectorAll('.project-tags .tag, .categories a'))
            .map((el) => el.textContent.trim())
            .filter(Boolean),
    };
})()
"#;

/// One scraped project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Stable slug identifying the project.
    pub slug: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub total_raised: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub error: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedRecord for ProjectRecord {
    fn key(&self) -> &str {
        &self.slug
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn has_data(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.website.is_some()
            || self.total_raised.is_some()
            || !self.categories.is_empty()
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn failure(target: &Target, message: String) -> Self {
        Self {
            slug: target.key.clone(),
            name: None,
            description: None,
            website: None,
            total_raised: None,
            categories: Vec::new(),
            error: Some(message),
            scraped_at: Utc::now(),
        }
    }

    fn sort_key(&self) -> (String, String) {
        (
            self.categories.first().cloned().unwrap_or_default(),
            self.name
                .clone()
                .unwrap_or_else(|| self.slug.clone())
                .to_lowercase(),
        )
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Extracted {
    name: Option<String>,
    description: Option<String>,
    website: Option<String>,
    total_raised: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

/// Fetcher for project detail pages.
pub struct ProjectsFetcher {
    base_url: String,
    policy: PagePolicy,
}

impl ProjectsFetcher {
    pub fn new(base_url: impl Into<String>, policy: PagePolicy) -> Self {
        Self {
            base_url: base_url.into(),
            policy,
        }
    }

    pub fn target_for(&self, slug: &str) -> Target {
        Target::new(
            slug,
            format!("{}/projects/{slug}/", self.base_url.trim_end_matches('/')),
        )
    }
}

#[async_trait]
impl TargetFetcher for ProjectsFetcher {
    type Record = ProjectRecord;

    async fn fetch(&self, cx: &mut FetchContext<'_>, target: &Target) -> Result<ProjectRecord> {
        let page = load_page(cx, &target.url, READY_SELECTOR, &self.policy).await?;

        let value = match extract_json(&page, EXTRACT_SCRIPT).await {
            Ok(v) => v,
            Err(e) => {
                close_page(cx, page, &target.key, Outcome::Error).await;
                return Err(e);
            }
        };

        let extracted: Extracted = serde_json::from_value(value).unwrap_or_default();

        let record = ProjectRecord {
            slug: target.key.clone(),
            name: extracted.name,
            description: extracted.description,
            website: extracted.website,
            total_raised: extracted.total_raised,
            categories: extracted.categories,
            error: None,
            scraped_at: Utc::now(),
        };

        close_page(cx, page, &target.key, outcome_of(record.has_data())).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_record_nulls_domain_fields() {
        let t = Target::new("uniswap", "https://x/projects/uniswap/");
        let rec = ProjectRecord::failure(&t, "navigation timed out".to_string());
        assert_eq!(rec.key(), "uniswap");
        assert!(!rec.has_data());
        assert!(rec.name.is_none() && rec.website.is_none() && rec.categories.is_empty());
    }

    #[test]
    fn test_sort_key_uses_first_category() {
        let mut a = ProjectRecord::failure(&Target::new("a", "u"), String::new());
        a.error = None;
        a.name = Some("Zed".to_string());
        a.categories = vec!["DeFi".to_string()];

        let mut b = a.clone();
        b.name = Some("Abc".to_string());
        b.categories = vec!["Infra".to_string()];

        // Category group dominates name.
        assert!(a.sort_key() < b.sort_key());
    }
}
