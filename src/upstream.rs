// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Upstream data source: a key-authenticated HTTPS JSON endpoint that
//! enumerates candidate funds.
//!
//! The core's only dependency on it is "fetch all items, filter by
//! tier". Failure here before the scraping loop starts is fatal.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// One candidate item from the upstream listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamItem {
    /// Stable identifying key (slug).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Category tier (1 = primary, 2 = secondary).
    pub tier: u32,
}

/// HTTP client for the upstream listing endpoint.
pub struct UpstreamClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("fundlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Fetch the full candidate list.
    pub async fn fetch_items(&self) -> Result<Vec<UpstreamItem>> {
        let url = format!("{}/funds", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("upstream source unreachable: {url}"))?
            .error_for_status()
            .with_context(|| format!("upstream source rejected request: {url}"))?;

        let items: Vec<UpstreamItem> = response
            .json()
            .await
            .context("upstream source returned malformed JSON")?;

        Ok(items)
    }

    /// Fetch the candidate list filtered to the given tiers, preserving
    /// upstream order.
    pub async fn fetch_tiers(&self, tiers: &[u32]) -> Result<Vec<UpstreamItem>> {
        let items = self.fetch_items().await?;
        Ok(items
            .into_iter()
            .filter(|item| tiers.contains(&item.tier))
            .collect())
    }
}
