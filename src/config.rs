// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run configuration with documented defaults.
//!
//! Every knob the orchestration core reads lives here so tests can inject
//! fast, deterministic values (zero delays, a single attempt) instead of
//! patching module globals.

use std::path::PathBuf;
use std::time::Duration;

/// How the retry policy treats a navigation that succeeds but yields
/// zero extracted fields.
///
/// A legitimately empty page (the last page of a paginated listing) is
/// indistinguishable from a transient extraction failure, so the choice
/// belongs to the caller rather than the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPage {
    /// Treat an empty extraction as a transient failure and retry while
    /// attempts remain. On the final attempt the empty record is returned
    /// with its `error` field set instead of being raised.
    Retry,
    /// Accept an empty extraction as a valid terminal result immediately.
    Accept,
}

/// Default number of fetch attempts per target.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Default delay between successive targets.
pub const DEFAULT_THROTTLE_DELAY: Duration = Duration::from_millis(1500);

/// Default page-load timeout per navigation.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default selector/content-readiness timeout, after which extraction
/// proceeds best-effort.
pub const DEFAULT_CONTENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for one scraping run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// WebSocket endpoint of the remote browser-automation service
    /// (a CDP debug URL, e.g. `ws://browserless:3000`).
    pub browser_ws_url: String,
    /// Base URL of the site being scraped.
    pub site_base_url: String,
    /// Base URL of the upstream data source.
    pub upstream_base_url: String,
    /// Static API key for the upstream data source.
    pub upstream_api_key: String,
    /// Fetch attempts per target before recording a failure.
    pub max_attempts: u32,
    /// Fixed delay between attempts (none after the last).
    pub retry_delay: Duration,
    /// Fixed delay between successive targets.
    pub throttle_delay: Duration,
    /// Timeout for a single page navigation.
    pub page_timeout: Duration,
    /// Timeout waiting for the content selector before extracting anyway.
    pub content_timeout: Duration,
    /// Empty-extraction policy.
    pub empty_page: EmptyPage,
    /// Directory for persisted result sets.
    pub output_dir: PathBuf,
    /// Directory for per-attempt screenshots; `None` disables diagnostics.
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            browser_ws_url: env_or("FUNDLENS_BROWSER_WS", "ws://127.0.0.1:3000"),
            site_base_url: env_or("FUNDLENS_SITE_URL", "https://crypto-fundraising.info"),
            upstream_base_url: env_or("FUNDLENS_UPSTREAM_URL", "https://api.cryptorank.io/v1"),
            upstream_api_key: std::env::var("FUNDLENS_API_KEY").unwrap_or_default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            throttle_delay: DEFAULT_THROTTLE_DELAY,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            content_timeout: DEFAULT_CONTENT_TIMEOUT,
            empty_page: EmptyPage::Retry,
            output_dir: PathBuf::from("output"),
            screenshot_dir: None,
        }
    }
}

impl ScrapeConfig {
    /// A configuration suited to tests: one attempt, zero delays.
    pub fn fast() -> Self {
        Self {
            max_attempts: 1,
            retry_delay: Duration::ZERO,
            throttle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ScrapeConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.retry_delay, Duration::from_millis(2000));
        assert_eq!(cfg.empty_page, EmptyPage::Retry);
        assert!(cfg.screenshot_dir.is_none());
    }

    #[test]
    fn test_fast_config_has_no_delays() {
        let cfg = ScrapeConfig::fast();
        assert_eq!(cfg.max_attempts, 1);
        assert_eq!(cfg.retry_delay, Duration::ZERO);
        assert_eq!(cfg.throttle_delay, Duration::ZERO);
    }
}
