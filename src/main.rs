// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use fundlens::cli;
use fundlens::config::ScrapeConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fundlens",
    about = "Fundlens — resilient remote-browser scraper for fund, funding-round, and project data",
    version,
    after_help = "Run 'fundlens <command> --help' for details on each command."
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output directory for result files
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Screenshot directory (implies a location for --screenshots)
    #[arg(long, global = true)]
    shots_dir: Option<PathBuf>,

    /// CDP WebSocket URL of the remote browser endpoint
    #[arg(long, global = true)]
    browser_ws: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape fund profile pages for funds listed by the upstream source
    Funds {
        /// Scrape at most this many funds
        #[arg(long)]
        limit: Option<usize>,
        /// Also include tier-2 funds from the upstream listing
        #[arg(long)]
        include_tier2: bool,
        /// Capture a screenshot per fetch attempt
        #[arg(long)]
        screenshots: bool,
        /// Ignore cached results and refetch everything
        #[arg(long)]
        fresh: bool,
    },
    /// Scrape the paginated funding-rounds table
    Rounds {
        /// Number of listing pages to fetch
        #[arg(long, default_value = "10")]
        pages: u32,
        /// Treat an empty table page as a valid terminal result
        #[arg(long)]
        accept_empty: bool,
        /// Capture a screenshot per fetch attempt
        #[arg(long)]
        screenshots: bool,
        /// Ignore cached results and refetch everything
        #[arg(long)]
        fresh: bool,
    },
    /// Scrape project detail pages by slug
    Projects {
        /// Project slugs to scrape
        slugs: Vec<String>,
        /// Scrape at most this many projects
        #[arg(long)]
        limit: Option<usize>,
        /// Capture a screenshot per fetch attempt
        #[arg(long)]
        screenshots: bool,
        /// Ignore cached results and refetch everything
        #[arg(long)]
        fresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.quiet {
        std::env::set_var("FUNDLENS_QUIET", "1");
    }
    if cli.no_color {
        std::env::set_var("FUNDLENS_NO_COLOR", "1");
    }

    let default_level = if cli.verbose {
        "fundlens=debug"
    } else {
        "fundlens=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = ScrapeConfig::default();
    if let Some(out) = cli.out {
        cfg.output_dir = out;
    }
    if let Some(dir) = cli.shots_dir {
        cfg.screenshot_dir = Some(dir);
    } else if cfg.screenshot_dir.is_none() {
        cfg.screenshot_dir = Some(cfg.output_dir.join("screenshots"));
    }
    if let Some(ws) = cli.browser_ws {
        cfg.browser_ws_url = ws;
    }

    let result = match cli.command {
        Commands::Funds {
            limit,
            include_tier2,
            screenshots,
            fresh,
        } => cli::funds_cmd::run(cfg, limit, include_tier2, screenshots, fresh).await,
        Commands::Rounds {
            pages,
            accept_empty,
            screenshots,
            fresh,
        } => cli::rounds_cmd::run(cfg, pages, accept_empty, screenshots, fresh).await,
        Commands::Projects {
            slugs,
            limit,
            screenshots,
            fresh,
        } => cli::projects_cmd::run(cfg, slugs, limit, screenshots, fresh).await,
    };

    // Consistent exit codes: 0=success, 1=fatal error
    if let Err(e) = &result {
        let s = cli::output::Styled::new();
        eprintln!("  {} Error: {e:#}", s.fail_sym());
        std::process::exit(1);
    }

    result
}
