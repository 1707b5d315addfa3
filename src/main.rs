// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use verkko_scanner::config::{AuthConfig, CrawlerOptions};
use verkko_scanner::scanners::ScanEngine;
use verkko_scanner::types::ScanMode;

#[derive(Parser, Debug)]
#[command(
    name = "verkko-scanner",
    version,
    about = "Web application vulnerability scanner: crawl, analyze, probe, score"
)]
struct Cli {
    /// Target root URL, e.g. https://staging.example.com
    target: String,

    /// Scan mode: static, dynamic or both
    #[arg(long, default_value = "both")]
    mode: ScanModeArg,

    /// Maximum crawl depth from the root (1-10)
    #[arg(long, default_value_t = 3)]
    max_depth: usize,

    /// Maximum pages fetched during the crawl (1-500)
    #[arg(long, default_value_t = 50)]
    max_pages: usize,

    /// Minimum spacing between requests to one host, in milliseconds (100-10000)
    #[arg(long, default_value_t = 500)]
    rate_limit_ms: u64,

    /// Crawl paths disallowed by robots.txt (requires authorization for the target)
    #[arg(long)]
    robots_override_consent: bool,

    /// Follow links to other hosts
    #[arg(long)]
    allow_external: bool,

    /// Path to a package.json analyzed for vulnerable dependencies
    #[arg(long)]
    manifest: Option<std::path::PathBuf>,

    /// Path to a JSON authenticated-scan configuration
    #[arg(long)]
    auth_config: Option<std::path::PathBuf>,

    /// Write the full JSON result set to this file instead of stdout
    #[arg(long, short)]
    output: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ScanModeArg {
    Static,
    Dynamic,
    Both,
}

impl From<ScanModeArg> for ScanMode {
    fn from(arg: ScanModeArg) -> Self {
        match arg {
            ScanModeArg::Static => ScanMode::Static,
            ScanModeArg::Dynamic => ScanMode::Dynamic,
            ScanModeArg::Both => ScanMode::Both,
        }
    }
}

fn banner() {
    print!("\x1b[92m");
    println!(" _   __         __   __");
    println!("| | / /__ _____/ /__/ /_____");
    println!("| |/ / -_) __/  '_/  '_/ _ \\");
    print!("\x1b[91m");
    println!("|___/\\__/_/ /_/\\_\\/_/\\_\\___/");
    print!("\x1b[0m\x1b[1m\x1b[97m");
    println!("      Web Security Scanner");
    print!("\x1b[0m");
    println!();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    banner();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("verkko-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let options = CrawlerOptions {
        max_depth: cli.max_depth,
        max_pages: cli.max_pages,
        rate_limit_ms: cli.rate_limit_ms,
        respect_robots: true,
        robots_override_consent: cli.robots_override_consent,
        allow_external: cli.allow_external,
        ..CrawlerOptions::default()
    };

    let mut engine = ScanEngine::new(options);

    if let Some(path) = &cli.manifest {
        let manifest = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        engine = engine.with_dependency_manifest(manifest);
    }

    let auth: Option<AuthConfig> = match &cli.auth_config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read auth config {}", path.display()))?;
            Some(serde_json::from_str(&raw).context("Auth config is not valid JSON")?)
        }
        None => None,
    };

    let results = engine
        .run_scan(&cli.target, cli.mode.into(), auth)
        .await
        .context("Scan failed")?;

    info!(
        "Scan complete: score {} ({}), {} findings, {} tests",
        results.scoring.score,
        results.scoring.risk_level,
        results.findings.len(),
        results.tests.len()
    );

    let json = serde_json::to_string_pretty(&results)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
