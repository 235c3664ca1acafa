// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! `fundlens funds` — scrape fund profile pages.

use crate::cli::output;
use crate::config::ScrapeConfig;
use crate::diagnostics::Diagnostics;
use crate::domains::funds::{FundListing, FundsFetcher};
use crate::domains::PagePolicy;
use crate::orchestrator::Orchestrator;
use crate::retry::RetryPolicy;
use crate::session::RemoteSession;
use crate::store::IncrementalStore;
use crate::throttle::Throttle;
use crate::upstream::UpstreamClient;
use anyhow::Result;
use std::collections::HashMap;
use tracing::info;

/// Run the funds command.
pub async fn run(
    cfg: ScrapeConfig,
    limit: Option<usize>,
    include_tier2: bool,
    screenshots: bool,
    fresh: bool,
) -> Result<()> {
    let tiers: &[u32] = if include_tier2 { &[1, 2] } else { &[1] };

    let upstream = UpstreamClient::new(cfg.upstream_base_url.as_str(), cfg.upstream_api_key.as_str());
    let mut items = upstream.fetch_tiers(tiers).await?;
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    info!("upstream listed {} funds (tiers {tiers:?})", items.len());

    let listing: HashMap<String, FundListing> = items
        .iter()
        .map(|item| {
            (
                item.key.clone(),
                FundListing {
                    name: item.name.clone(),
                    tier: item.tier,
                },
            )
        })
        .collect();

    let fetcher = FundsFetcher::new(
        cfg.site_base_url.as_str(),
        PagePolicy::from_config(&cfg),
        listing,
    );
    let targets: Vec<_> = items.iter().map(|item| fetcher.target_for(&item.key)).collect();

    let store = IncrementalStore::new(&cfg.output_dir, "funds");
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
            orchestrator = orchestrator.with_diagnostics(Diagnostics::new(dir.join("funds")));
        }
    }

    let summary = orchestrator.run(&targets).await?;
    output::print_summary(&summary);
    Ok(())
}
