// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! `fundlens projects` — scrape project detail pages by slug.

use crate::cli::output;
use crate::config::ScrapeConfig;
use crate::diagnostics::Diagnostics;
use crate::domains::projects::ProjectsFetcher;
use crate::domains::PagePolicy;
use crate::orchestrator::Orchestrator;
use crate::retry::RetryPolicy;
use crate::session::RemoteSession;
use crate::store::IncrementalStore;
use crate::throttle::Throttle;
use anyhow::{bail, Result};

/// Run the projects command for the given slugs.
pub async fn run(
    cfg: ScrapeConfig,
    slugs: Vec<String>,
    limit: Option<usize>,
    screenshots: bool,
    fresh: bool,
) -> Result<()> {
    if slugs.is_empty() {
        bail!("no project slugs given");
    }

    let fetcher = ProjectsFetcher::new(cfg.site_base_url.as_str(), PagePolicy::from_config(&cfg));
    let mut targets: Vec<_> = slugs.iter().map(|slug| fetcher.target_for(slug)).collect();
    if let Some(limit) = limit {
        targets.truncate(limit);
    }

    let store = IncrementalStore::new(&cfg.output_dir, "projects");
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
            orchestrator = orchestrator.with_diagnostics(Diagnostics::new(dir.join("projects")));
        }
    }

    let summary = orchestrator.run(&targets).await?;
    output::print_summary(&summary);
    Ok(())
}
