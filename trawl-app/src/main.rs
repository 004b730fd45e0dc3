use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trawl_common::observability::{LogFormat, init_logging};
use trawl_config::{TrawlConfig, TrawlConfigLoader};
use trawl_drivers::browser::driver::TrawlDriver;
use trawl_scrape::run::run;

/// Collect job listings through a browser session and write them as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "jobtrawl", version, about)]
struct Cli {
    /// YAML config file; without it the user config dir and ./jobtrawl.yaml
    /// are layered when present
    #[arg(short, long, env = "JOBTRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Output file (newline-delimited JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Result pages to collect from; 0 follows "Next" until it disappears
    #[arg(long)]
    max_pages: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn load_config(&self) -> Result<TrawlConfig> {
        let loader = match &self.config {
            Some(path) => TrawlConfigLoader::new().with_file(path),
            None => TrawlConfigLoader::new().with_discovered_files(),
        };
        let cfg = loader.load().context("failed to load configuration")?;
        let cfg = self.apply(cfg);
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }

    /// Flags take precedence over every config source.
    fn apply(&self, mut cfg: TrawlConfig) -> TrawlConfig {
        if let Some(path) = &self.output {
            cfg.output.path = path.clone();
        }
        if self.headless {
            cfg.browser.headless = true;
        }
        if let Some(n) = self.max_pages {
            cfg.pagination.max_pages = Some(n);
        }
        if self.log_json {
            cfg.logging.format = LogFormat::Json;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    let log_path = init_logging("jobtrawl", &cfg.logging)?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let mut driver = TrawlDriver::connect(&cfg.browser)
        .await
        .context("failed to start browser session")?;

    let summary = run(&mut driver, &cfg).await?;
    println!(
        "Wrote {} records ({} without details) from {} listings to {}",
        summary.records,
        summary.unmatched,
        summary.listings,
        summary.output.display()
    );
    Ok(())
}
