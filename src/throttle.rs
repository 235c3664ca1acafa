// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-delay gate between successive targets.
//!
//! Bounds request rate against the scraped site. Strictly sequential and
//! not adaptive: no backoff, no concurrency. Applied between units of
//! work, never before the first or after the last.

use std::time::Duration;

/// Fixed inter-target delay.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Suspend for the configured delay. Zero delay returns immediately.
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
