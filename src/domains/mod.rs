// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-specific fetchers.
//!
//! Each domain (fund pages, funding-round table pages, project detail
//! pages) supplies only its URL template and in-page extraction script;
//! the retry/session/persistence machinery is shared and lives in the
//! core. Helpers here cover the common open/navigate/wait/extract/close
//! sequence over a chromiumoxide page.

pub mod funds;
pub mod projects;
pub mod rounds;

use crate::config::ScrapeConfig;
use crate::diagnostics::Outcome;
use crate::fetcher::FetchContext;
use anyhow::{bail, Context, Result};
use chromiumoxide::page::Page;
use std::time::{Duration, Instant};
use tracing::debug;

/// Navigation and readiness timeouts shared by all domain fetchers.
#[derive(Debug, Clone, Copy)]
pub struct PagePolicy {
    /// Hard bound on one navigation.
    pub page_timeout: Duration,
    /// Bound on waiting for the content selector; extraction proceeds
    /// best-effort once it expires.
    pub content_timeout: Duration,
}

impl PagePolicy {
    pub fn from_config(cfg: &ScrapeConfig) -> Self {
        Self {
            page_timeout: cfg.page_timeout,
            content_timeout: cfg.content_timeout,
        }
    }
}

/// Selector poll interval while waiting for content readiness.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Open a tab, navigate to `url`, and wait for `wait_selector`.
///
/// The navigation timeout is hard: expiry closes the tab and errors.
/// The readiness timeout is soft: expiry logs and returns the page
/// anyway so extraction can proceed best-effort.
pub(crate) async fn load_page(
    cx: &mut FetchContext<'_>,
    url: &str,
    wait_selector: &str,
    policy: &PagePolicy,
) -> Result<Page> {
    let browser = cx.session.browser()?;
    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to open tab")?;

    match tokio::time::timeout(policy.page_timeout, page.goto(url)).await {
        Ok(Ok(_)) => {
            let _ = page.wait_for_navigation().await;
        }
        Ok(Err(e)) => {
            let _ = page.close().await;
            return Err(e).with_context(|| format!("navigation failed: {url}"));
        }
        Err(_) => {
            let _ = page.close().await;
            bail!(
                "navigation timed out after {}ms: {url}",
                policy.page_timeout.as_millis()
            );
        }
    }

    let deadline = Instant::now() + policy.content_timeout;
    loop {
        if page.find_element(wait_selector).await.is_ok() {
            break;
        }
        if Instant::now() >= deadline {
            debug!("selector {wait_selector:?} not ready on {url}, extracting best-effort");
            break;
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }

    Ok(page)
}

/// Evaluate a read-only extraction script and return its JSON result.
pub(crate) async fn extract_json(page: &Page, script: &str) -> Result<serde_json::Value> {
    let result = page
        .evaluate(script)
        .await
        .context("extraction script failed")?;

    result
        .into_value()
        .map_err(|e| anyhow::anyhow!("failed to convert extraction result: {e:?}"))
}

/// Capture the per-attempt screenshot (if diagnostics are enabled) and
/// close the tab. Close errors are ignored; the tab is gone either way.
pub(crate) async fn close_page(
    cx: &mut FetchContext<'_>,
    page: Page,
    key: &str,
    outcome: Outcome,
) {
    if let Some(diag) = cx.diagnostics {
        diag.capture(&page, key, cx.attempt, outcome).await;
    }
    let _ = page.close().await;
}

/// Outcome bucket for a freshly built record.
pub(crate) fn outcome_of(has_data: bool) -> Outcome {
    if has_data {
        Outcome::Success
    } else {
        Outcome::NoData
    }
}
