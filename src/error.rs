// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the orchestration core.
//!
//! Only two failure classes escape to the top level: a fatal startup
//! failure (upstream source or browser endpoint unreachable before any
//! work has started) and a failed final persist (which would lose the
//! run's output). Everything else is resolved to a record-level `error`
//! field or swallowed (diagnostics).

use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The upstream data source or the remote browser endpoint could not
    /// be reached before any target was processed.
    #[error("fatal startup failure: {0:#}")]
    FatalStartup(anyhow::Error),

    /// The final (non-partial) persist failed; the run's output would be
    /// lost, so this is fatal even though partial persist failures are not.
    #[error("final persist failed: {0:#}")]
    FinalPersist(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_cause_chain() {
        let cause = anyhow::anyhow!("connection refused").context("connecting to endpoint");
        let e = ScrapeError::FatalStartup(cause);
        let msg = e.to_string();
        assert!(msg.contains("fatal startup"));
        assert!(msg.contains("connection refused"));
    }
}
