// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Console output helpers: quiet/no-color flags and status symbols.

use crate::orchestrator::RunSummary;

/// Whether non-essential output is suppressed.
pub fn is_quiet() -> bool {
    std::env::var("FUNDLENS_QUIET").is_ok_and(|v| v == "1")
}

fn no_color() -> bool {
    std::env::var("FUNDLENS_NO_COLOR").is_ok_and(|v| v == "1")
        || std::env::var("NO_COLOR").is_ok()
}

/// Status symbols, colored unless disabled.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self { color: !no_color() }
    }

    pub fn ok_sym(&self) -> String {
        if self.color {
            "\x1b[32m✓\x1b[0m".to_string()
        } else {
            "✓".to_string()
        }
    }

    pub fn fail_sym(&self) -> String {
        if self.color {
            "\x1b[31m✗\x1b[0m".to_string()
        } else {
            "✗".to_string()
        }
    }

    pub fn warn_sym(&self) -> String {
        if self.color {
            "\x1b[33m!\x1b[0m".to_string()
        } else {
            "!".to_string()
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

/// Print the end-of-run summary block.
pub fn print_summary(summary: &RunSummary) {
    if is_quiet() {
        return;
    }
    let s = Styled::new();
    let sym = if summary.failed == 0 {
        s.ok_sym()
    } else {
        s.warn_sym()
    };
    eprintln!();
    eprintln!(
        "  {sym} {} scraped, {} failed, {} reused from cache ({:.1}s)",
        summary.successful,
        summary.failed,
        summary.skipped_cached,
        summary.duration_ms as f64 / 1000.0
    );
    eprintln!("  Results: {}", summary.output_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_without_color() {
        let s = Styled { color: false };
        assert_eq!(s.ok_sym(), "✓");
        assert_eq!(s.fail_sym(), "✗");
        assert_eq!(s.warn_sym(), "!");
    }
}
