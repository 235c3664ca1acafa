// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-attempt screenshot diagnostics.
//!
//! Pure side effect: artifacts are written to a side directory organized
//! by outcome and are never read back by the core. Every failure in this
//! module is swallowed after a debug log so diagnostics can never affect
//! a fetch result.

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use std::path::PathBuf;
use tracing::debug;

/// Outcome of one fetch attempt, used to bucket artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoData,
    Error,
}

impl Outcome {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoData => "no-data",
            Self::Error => "error",
        }
    }
}

/// Screenshot sink rooted at a directory.
pub struct Diagnostics {
    root: PathBuf,
}

impl Diagnostics {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Capture a full-page screenshot of `page`, keyed by target key,
    /// attempt number, and outcome. Never fails.
    pub async fn capture(&self, page: &Page, key: &str, attempt: u32, outcome: Outcome) {
        let dir = self.root.join(outcome.dir_name());
        if let Err(e) = std::fs::create_dir_all(&dir) {
            debug!("screenshot dir creation failed (ignored): {e}");
            return;
        }

        let filename = format!("{}-attempt-{attempt}.png", sanitize(key));
        let path = dir.join(filename);

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        match page.screenshot(params).await {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&path, bytes) {
                    debug!("screenshot write failed (ignored): {e}");
                } else {
                    debug!("screenshot saved: {}", path.display());
                }
            }
            Err(e) => debug!("screenshot capture failed (ignored): {e}"),
        }
    }
}

/// Make a target key safe to use as a filename.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keys() {
        assert_eq!(sanitize("a16z"), "a16z");
        assert_eq!(sanitize("page-0003"), "page-0003");
        assert_eq!(sanitize("fund/with spaces"), "fund_with_spaces");
    }

    #[test]
    fn test_outcome_dirs() {
        assert_eq!(Outcome::Success.dir_name(), "success");
        assert_eq!(Outcome::NoData.dir_name(), "no-data");
        assert_eq!(Outcome::Error.dir_name(), "error");
    }
}
