// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! `fundlens rounds` — scrape the paginated funding-rounds table.

use crate::cli::output;
use crate::config::{EmptyPage, ScrapeConfig};
use crate::diagnostics::Diagnostics;
use crate::domains::rounds::RoundsFetcher;
use crate::domains::PagePolicy;
use crate::orchestrator::Orchestrator;
use crate::retry::RetryPolicy;
use crate::session::RemoteSession;
use crate::store::IncrementalStore;
use crate::throttle::Throttle;
use anyhow::Result;

/// Run the rounds command over listing pages `1..=pages`.
///
/// `accept_empty` switches the empty-page policy: useful when probing
/// past the last known page, where an empty table is a valid terminal
/// result rather than a transient failure.
pub async fn run(
    mut cfg: ScrapeConfig,
    pages: u32,
    accept_empty: bool,
    screenshots: bool,
    fresh: bool,
) -> Result<()> {
    if accept_empty {
        cfg.empty_page = EmptyPage::Accept;
    }

    let fetcher = RoundsFetcher::new(cfg.site_base_url.as_str(), PagePolicy::from_config(&cfg));
    let targets = fetcher.targets(pages);

    let store = IncrementalStore::new(&cfg.output_dir, "funding-rounds");
    let mut orchestrator = Orchestrator::new(
        RemoteSession::new(cfg.browser_ws_url.as_str()),
        fetcher,
        store,
        RetryPolicy::from_config(&cfg),
        Throttle::new(cfg.throttle_delay),
    )
    .fresh(fresh);

    if screenshots {
        if let Some(dir) = &cfg.screenshot_dir {
            orchestrator = orchestrator.with_diagnostics(Diagnostics::new(dir.join("rounds")));
        }
    }

    let summary = orchestrator.run(&targets).await?;
    output::print_summary(&summary);
    Ok(())
}
