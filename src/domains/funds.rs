// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fund profile pages.

use super::{close_page, extract_json, load_page, outcome_of, PagePolicy};
use crate::diagnostics::Outcome;
use crate::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selector that indicates the fund profile has rendered.
const READY_SELECTOR: &str = ".fund-profile, main h1";

/// Read-only extraction over a loaded fund profile page.
const EXTRACT_SCRIPT: &str = r#"
(() => {
    const text = (sel) => {
        const el = document.querySelector(sel);
        return el && el.textContent.trim() ? el.textContent.trim() : null;
    };
    const links = Array.from(document.querySelectorAll('.fund-links a, .social-links a, .fund-profile a'));
    const byHost = (host) => {
        const a = links.find((l) => l.href && l.href.includes(host));
        return a ? a.href : null;
    };
    const website = (() => {
        const a = links.find((l) => l.matches('a.website, a[data-role="website"], a[rel~="external"]'));
        return a ? a.href : null;
    })();
    return {
        name: text('.fund-profile h1, main h1'),
        description: text('.fund-description, .fund-about p'),
        website: website,
        twitter: byHost('twitter.com') || byHost('x.com'),
        linkedin: byHost('linkedin.com'),
        focus: Array.from(document.querySelectorAll('.fund-tags .tag, .categories a'))
            .map((el) => el.textContent.trim())
            .filter(Boolean),
    };
})()
"#;

/// One scraped fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    /// Stable slug from the upstream listing.
    pub slug: String,
    pub name: Option<String>,
    /// Category tier from the upstream listing (0 when unknown).
    #[serde(default)]
    pub tier: u32,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub focus: Vec<String>,
    pub error: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedRecord for FundRecord {
    fn key(&self) -> &str {
        &self.slug
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn has_data(&self) -> bool {
        self.website.is_some()
            || self.twitter.is_some()
            || self.linkedin.is_some()
            || self.description.is_some()
            || !self.focus.is_empty()
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn failure(target: &Target, message: String) -> Self {
        Self {
            slug: target.key.clone(),
            name: None,
            tier: 0,
            website: None,
            twitter: None,
            linkedin: None,
            description: None,
            focus: Vec::new(),
            error: Some(message),
            scraped_at: Utc::now(),
        }
    }

    fn sort_key(&self) -> (String, String) {
        (
            format!("tier-{}", self.tier),
            self.name
                .clone()
                .unwrap_or_else(|| self.slug.clone())
                .to_lowercase(),
        )
    }
}

/// Fields the in-page script hands back.
#[derive(Debug, Deserialize, Default)]
struct Extracted {
    name: Option<String>,
    description: Option<String>,
    website: Option<String>,
    twitter: Option<String>,
    linkedin: Option<String>,
    #[serde(default)]
    focus: Vec<String>,
}

/// Metadata the upstream listing knows about a fund.
#[derive(Debug, Clone)]
pub struct FundListing {
    pub name: String,
    pub tier: u32,
}

/// Fetcher for fund profile pages.
pub struct FundsFetcher {
    base_url: String,
    policy: PagePolicy,
    /// Upstream listing metadata keyed by slug, stamped onto records.
    listing: HashMap<String, FundListing>,
}

impl FundsFetcher {
    pub fn new(
        base_url: impl Into<String>,
        policy: PagePolicy,
        listing: HashMap<String, FundListing>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            policy,
            listing,
        }
    }

    /// URL of one fund's profile page.
    pub fn target_for(&self, slug: &str) -> Target {
        Target::new(
            slug,
            format!("{}/funds/{slug}/", self.base_url.trim_end_matches('/')),
        )
    }
}

#[async_trait]
impl TargetFetcher for FundsFetcher {
    type Record = FundRecord;

    async fn fetch(&self, cx: &mut FetchContext<'_>, target: &Target) -> Result<FundRecord> {
        let page = load_page(cx, &target.url, READY_SELECTOR, &self.policy).await?;

        let value = match extract_json(&page, EXTRACT_SCRIPT).await {
            Ok(v) => v,
            Err(e) => {
                close_page(cx, page, &target.key, Outcome::Error).await;
                return Err(e);
            }
        };

        let extracted: Extracted = serde_json::from_value(value).unwrap_or_default();
        let upstream = self.listing.get(&target.key);

        let record = FundRecord {
            slug: target.key.clone(),
            name: extracted
                .name
                .or_else(|| upstream.map(|l| l.name.clone())),
            tier: upstream.map(|l| l.tier).unwrap_or(0),
            website: extracted.website,
            twitter: extracted.twitter,
            linkedin: extracted.linkedin,
            description: extracted.description,
            focus: extracted.focus,
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

    fn success_record() -> FundRecord {
        FundRecord {
            slug: "a16z".to_string(),
            name: Some("Andreessen Horowitz".to_string()),
            tier: 1,
            website: Some("https://a16z.com".to_string()),
            twitter: None,
            linkedin: None,
            description: None,
            focus: vec!["infrastructure".to_string()],
            error: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_failure_record_has_only_identity() {
        let target = Target::new("a16z", "https://x/funds/a16z/");
        let rec = FundRecord::failure(&target, "timeout".to_string());
        assert_eq!(rec.key(), "a16z");
        assert_eq!(rec.error(), Some("timeout"));
        assert!(!rec.has_data());
        assert!(rec.website.is_none() && rec.name.is_none());
    }

    #[test]
    fn test_sort_key_groups_by_tier_then_name() {
        let mut a = success_record();
        a.tier = 2;
        let b = success_record();
        assert!(b.sort_key() < a.sort_key());
    }

    #[test]
    fn test_serialized_shape_is_camel_case() {
        let json = serde_json::to_value(success_record()).unwrap();
        assert!(json.get("scrapedAt").is_some());
        assert!(json.get("error").is_some());
    }

    #[test]
    fn test_target_url_template() {
        let fetcher = FundsFetcher::new(
            "https://crypto-fundraising.info",
            PagePolicy {
                page_timeout: std::time::Duration::from_secs(30),
                content_timeout: std::time::Duration::from_secs(15),
            },
            HashMap::new(),
        );
        let t = fetcher.target_for("a16z");
        assert_eq!(t.url, "https://crypto-fundraising.info/funds/a16z/");
    }
}
