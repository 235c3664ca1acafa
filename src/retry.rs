// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry around a single target fetch.
//!
//! Wraps one [`TargetFetcher`] call with up to `max_attempts` attempts and
//! a fixed delay between them (none after the last). Before each attempt
//! the session is revalidated; errors the session classifies as connection
//! loss invalidate the handle so the next attempt reconnects. A fetch that
//! exhausts its attempts resolves to a failure record rather than an
//! error, so one bad target never aborts the run.

use crate::config::{EmptyPage, ScrapeConfig};
use crate::diagnostics::Diagnostics;
use crate::fetcher::{FetchContext, ScrapedRecord, Target, TargetFetcher};
use crate::session::Session;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for a single target.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub empty_page: EmptyPage,
}

impl RetryPolicy {
    pub fn from_config(cfg: &ScrapeConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            retry_delay: cfg.retry_delay,
            empty_page: cfg.empty_page,
        }
    }

    /// Fetch one target under the retry policy.
    ///
    /// Always produces a record: a success, a success-with-empty-payload
    /// (error field set when the empty-page policy is [`EmptyPage::Retry`]
    /// and attempts ran out), or a failure record carrying the last
    /// attempt's error message.
    pub async fn execute<F: TargetFetcher>(
        &self,
        session: &mut dyn Session,
        fetcher: &F,
        target: &Target,
        diagnostics: Option<&Diagnostics>,
    ) -> F::Record {
        let mut last_error = String::from("fetch failed");

        for attempt in 1..=self.max_attempts {
            if let Err(e) = session.ensure_connected().await {
                last_error = format!("{e:#}");
                warn!(
                    target_key = %target.key,
                    attempt,
                    "session connect failed: {last_error}"
                );
                self.delay_if_attempts_remain(attempt).await;
                continue;
            }

            let mut cx = FetchContext {
                session: &mut *session,
                attempt,
                diagnostics,
            };

            match fetcher.fetch(&mut cx, target).await {
                Ok(record) if record.has_data() => return record,
                Ok(mut record) => match self.empty_page {
                    EmptyPage::Accept => return record,
                    EmptyPage::Retry => {
                        if attempt < self.max_attempts {
                            debug!(target_key = %target.key, attempt, "no data extracted, retrying");
                            tokio::time::sleep(self.retry_delay).await;
                            continue;
                        }
                        record.set_error(format!(
                            "no data extracted after {} attempts",
                            self.max_attempts
                        ));
                        return record;
                    }
                },
                Err(e) => {
                    if session.is_connection_loss(&e) {
                        session.invalidate();
                    }
                    last_error = format!("{e:#}");
                    warn!(
                        target_key = %target.key,
                        attempt,
                        max_attempts = self.max_attempts,
                        "fetch attempt failed: {last_error}"
                    );
                    self.delay_if_attempts_remain(attempt).await;
                }
            }
        }

        F::Record::failure(target, last_error)
    }

    async fn delay_if_attempts_remain(&self, attempt: u32) {
        if attempt < self.max_attempts && !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingFetcher, StubRecord, StubSession};

    fn policy(max_attempts: u32, empty_page: EmptyPage) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            retry_delay: Duration::ZERO,
            empty_page,
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::fail_then_succeed(0);
        let target = Target::new("a", "https://x/a");

        let rec = policy(3, EmptyPage::Retry)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert!(rec.error().is_none());
        assert_eq!(fetcher.attempts(), 1);
        assert_eq!(session.connects, 1);
    }

    #[tokio::test]
    async fn test_retry_bound_exact_attempts() {
        // Fails N times then succeeds; with M attempts, succeeds iff N < M
        // and exactly min(N+1, M) attempts are made.
        for (n, m, should_succeed) in [(0u32, 3u32, true), (2, 3, true), (3, 3, false), (5, 2, false)]
        {
            let mut session = StubSession::new();
            let fetcher = CountingFetcher::fail_then_succeed(n);
            let target = Target::new("k", "https://x/k");

            let rec = policy(m, EmptyPage::Retry)
                .execute(&mut session, &fetcher, &target, None)
                .await;

            assert_eq!(rec.error().is_none(), should_succeed, "n={n} m={m}");
            assert_eq!(fetcher.attempts(), (n + 1).min(m), "n={n} m={m}");
        }
    }

    #[tokio::test]
    async fn test_exhausted_attempts_yield_failure_record() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::always_fail("timeout");
        let target = Target::new("b", "https://x/b");

        let rec = policy(3, EmptyPage::Retry)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert_eq!(fetcher.attempts(), 3);
        assert_eq!(rec.key(), "b");
        assert!(rec.error().unwrap().contains("timeout"));
        assert!(!rec.has_data());
    }

    #[tokio::test]
    async fn test_connection_loss_invalidates_session() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::fail_with_then_succeed("connection closed", 1);
        let target = Target::new("c", "https://x/c");

        let rec = policy(3, EmptyPage::Retry)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert!(rec.error().is_none());
        assert_eq!(session.invalidations, 1);
        // Reconnected before the second attempt.
        assert_eq!(session.connects, 2);
    }

    #[tokio::test]
    async fn test_plain_error_does_not_invalidate() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::fail_with_then_succeed("selector not found", 1);
        let target = Target::new("d", "https://x/d");

        policy(3, EmptyPage::Retry)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert_eq!(session.invalidations, 0);
        assert_eq!(session.connects, 1);
    }

    #[tokio::test]
    async fn test_empty_retry_policy_sets_error_on_last_attempt() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::always_empty();
        let target = Target::new("e", "https://x/e");

        let rec = policy(3, EmptyPage::Retry)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert_eq!(fetcher.attempts(), 3);
        assert!(!rec.has_data());
        assert!(rec.error().unwrap().contains("no data extracted"));
    }

    #[tokio::test]
    async fn test_empty_accept_policy_returns_immediately() {
        let mut session = StubSession::new();
        let fetcher = CountingFetcher::always_empty();
        let target = Target::new("f", "https://x/f");

        let rec: StubRecord = policy(3, EmptyPage::Accept)
            .execute(&mut session, &fetcher, &target, None)
            .await;

        assert_eq!(fetcher.attempts(), 1);
        assert!(!rec.has_data());
        assert!(rec.error().is_none());
    }
}
