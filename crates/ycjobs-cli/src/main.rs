mod display;
mod server;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ycjobs_browser::ChromeLauncher;
use ycjobs_core::config::{
    ALL_COMPANIES_SNAPSHOT_URL, DEFAULT_API_URL, DEFAULT_LIMIT, DEFAULT_RESULTS_DIR,
    HIRING_SNAPSHOT_URL, SITE_ORIGIN,
};
use ycjobs_core::{CompanyFilters, Limit, ScraperConfig};
use ycjobs_runner::{CallbackReporter, CancellationToken, ProgressEvent, ScrapeRequest, Scraper};
use ycjobs_source::{HttpCompanyFeed, SNAPSHOT_TTL, SnapshotCache};
use ycjobs_store::ResultsStore;

use crate::server::{AppState, DirectorySources};

#[derive(Parser)]
#[command(name = "ycjobs", version, about = "Scrape open roles from YC company job boards")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConfigArgs {
    /// Filter-aware company API tried first.
    #[arg(long, global = true, env = "YCJOBS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Static company list used when the API is unreachable.
    #[arg(long, global = true, env = "YCJOBS_SNAPSHOT_URL", default_value = HIRING_SNAPSHOT_URL)]
    snapshot_url: String,

    /// Directory holding jobs.json and its backups.
    #[arg(long, global = true, env = "YCJOBS_RESULTS_DIR", default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Show the browser window.
    #[arg(long, global = true, env = "YCJOBS_HEADED")]
    headed: bool,

    /// Per-company page load timeout.
    #[arg(long, global = true, env = "YCJOBS_NAV_TIMEOUT_SECS", default_value_t = 30)]
    nav_timeout_secs: u64,
}

impl ConfigArgs {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            api_url: self.api_url.clone(),
            snapshot_url: self.snapshot_url.clone(),
            site_origin: SITE_ORIGIN.to_string(),
            results_dir: self.results_dir.clone(),
            default_limit: DEFAULT_LIMIT,
            headless: !self.headed,
            navigation_timeout: Duration::from_secs(self.nav_timeout_secs.max(1)),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Scrape job boards and write them to jobs.json.
    Scrape {
        /// Number of companies, or `all`.
        limit: Option<Limit>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        stage: Option<String>,
        /// Company name to scrape.
        #[arg(long, short = 'q')]
        query: Option<String>,
    },
    /// Print the last scrape's results.
    Results,
    /// Serve the company directory and scraper HTTP API.
    Serve {
        #[arg(long, env = "YCJOBS_BIND", default_value = "127.0.0.1:3000")]
        bind: String,

        /// Company list behind `/api/all`.
        #[arg(long, env = "YCJOBS_ALL_SNAPSHOT_URL", default_value = ALL_COMPANIES_SNAPSHOT_URL)]
        all_snapshot_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Scrape prints progress on stdout itself; keep the log for problems.
    let default_filter = match cli.command {
        Command::Scrape { .. } => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.scraper_config();
    match cli.command {
        Command::Scrape {
            limit,
            year,
            industry,
            region,
            stage,
            query,
        } => {
            let request = ScrapeRequest {
                limit,
                filters: CompanyFilters {
                    year,
                    industry,
                    region,
                    stage,
                    query,
                },
            };
            scrape(config, request).await
        }
        Command::Results => {
            let store = ResultsStore::from_config(&config);
            let results = store
                .read()
                .with_context(|| format!("failed to read {}", store.jobs_file().display()))?;
            print!("{}", display::render_results(&results));
            Ok(())
        }
        Command::Serve {
            bind,
            all_snapshot_url,
        } => {
            let sources = DirectorySources {
                hiring_url: config.snapshot_url.clone(),
                all_url: all_snapshot_url,
            };
            let store = ResultsStore::from_config(&config);
            let scraper = build_scraper(config)?;
            let snapshots = SnapshotCache::new(SNAPSHOT_TTL).context("failed to build HTTP client")?;
            let state = AppState::new(scraper, store, snapshots, sources);
            server::serve(&bind, state).await
        }
    }
}

fn build_scraper(config: ScraperConfig) -> anyhow::Result<Scraper<HttpCompanyFeed, ChromeLauncher>> {
    let feed = HttpCompanyFeed::new(config.api_url.clone(), config.snapshot_url.clone())
        .context("failed to build HTTP client")?;
    let launcher = ChromeLauncher::new(config.headless);
    Ok(Scraper::new(config, feed, launcher))
}

async fn scrape(config: ScraperConfig, request: ScrapeRequest) -> anyhow::Result<()> {
    let mut store = ResultsStore::from_config(&config);
    let scraper = build_scraper(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current company");
            on_interrupt.cancel();
        }
    });

    let mut reporter = CallbackReporter::new(|event: &ProgressEvent| match event {
        ProgressEvent::Message(line) => println!("{line}"),
        ProgressEvent::Complete(summary) => print!("\n{}", display::render_summary(summary)),
        ProgressEvent::Error(_) => {}
    });
    let summary = scraper
        .run_and_report(&mut store, &request, &mut reporter, &cancel)
        .await
        .context("scrape failed")?;
    info!(
        companies = summary.companies_scraped,
        jobs = summary.jobs_found,
        "scrape finished"
    );
    Ok(())
}
