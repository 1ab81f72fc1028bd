//! The scrape run.
//!
//! ```text
//! resolve companies ──(both sources fail)──> aborted
//!        │
//! launch browser ─> back up existing output
//!        │
//! for each company: open page, extract, persist all, close page
//!        │
//! close browser ─> complete
//! ```
//!
//! Companies are scraped one at a time, one page at a time, so the output order
//! matches the resolved order and only this run writes the output file.

use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use ycjobs_browser::{BrowserLauncher, BrowserSession, JobPage, extract_jobs};
use ycjobs_core::{CompanyFilters, CompanyRecord, CompanyScrapeResult, Limit, ScraperConfig};
use ycjobs_source::{CompanyFeed, NamePick, SourceOrigin, resolve};
use ycjobs_store::{BackupSnapshot, ResultsStore};

use crate::RunError;
use crate::progress::{ProgressEvent, ProgressReporter, RunSummary};

/// Invocation parameters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScrapeRequest {
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub limit: Option<Limit>,
    #[serde(flatten)]
    pub filters: CompanyFilters,
}

/// Runs scrapes against one company feed and one browser launcher.
pub struct Scraper<F, L> {
    config: ScraperConfig,
    feed: F,
    launcher: L,
}

/// Status lines go to the reporter and the log.
struct Progress<'a> {
    reporter: &'a mut dyn ProgressReporter,
}

impl Progress<'_> {
    fn say(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "ycjobs::progress", "{message}");
        self.reporter.report(ProgressEvent::Message(message));
    }
}

impl<F, L> Scraper<F, L>
where
    F: CompanyFeed,
    L: BrowserLauncher,
{
    pub fn new(config: ScraperConfig, feed: F, launcher: L) -> Self {
        Self {
            config,
            feed,
            launcher,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Run a scrape and finish the report with exactly one terminal event.
    pub async fn run_and_report(
        &self,
        store: &mut ResultsStore,
        request: &ScrapeRequest,
        reporter: &mut dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RunError> {
        let outcome = self.run(store, request, reporter, cancel).await;
        match &outcome {
            Ok(summary) => reporter.report(ProgressEvent::Complete(summary.clone())),
            Err(e) => reporter.report(ProgressEvent::Error(e.to_string())),
        }
        outcome
    }

    /// Run a scrape, reporting status lines but no terminal event.
    ///
    /// `store` is held for the whole run; nothing else may write its file
    /// meanwhile. `cancel` is checked before each company: the company in
    /// flight always finishes and is persisted.
    pub async fn run(
        &self,
        store: &mut ResultsStore,
        request: &ScrapeRequest,
        reporter: &mut dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RunError> {
        let mut progress = Progress { reporter };
        progress.say("--- YC Job Scraper Bot started ---");

        let filters = request.filters.normalized();
        let limit = request
            .limit
            .map(Limit::resolve)
            .unwrap_or(self.config.default_limit);
        let companies = self.resolve_companies(&filters, limit, &mut progress).await?;

        let output_file = store.jobs_file().to_path_buf();
        if companies.is_empty() {
            // Nothing to scrape: leave the browser and the output file alone.
            progress.say("No companies matched. Nothing to scrape.");
            return Ok(RunSummary {
                success: true,
                companies_scraped: 0,
                jobs_found: 0,
                cancelled: false,
                output_file,
                backup_file: None,
                results: Vec::new(),
            });
        }

        let session = self
            .launcher
            .launch()
            .await
            .map_err(RunError::BrowserLaunch)?;

        let backup = match store.backup_existing(Utc::now()) {
            Ok(backup) => backup,
            Err(e) => {
                close_session(session).await;
                return Err(e.into());
            }
        };
        match &backup {
            Some(BackupSnapshot { path, entries }) => {
                progress.say(format!("Found {entries} existing records in jobs.json"));
                progress.say(format!("Backup created: {}", path.display()));
                progress.say("Starting fresh scrape...");
            }
            None => progress.say("No existing data found. Starting fresh scrape..."),
        }

        let outcome = self
            .scrape_companies(&session, store, &companies, &mut progress, cancel)
            .await;
        close_session(session).await;
        let (results, jobs_found, cancelled) = outcome?;

        if cancelled {
            progress.say(format!(
                "Scrape cancelled after {} of {} companies.",
                results.len(),
                companies.len()
            ));
        }
        progress.say("Scraping complete!");
        progress.say(format!("Total companies scraped: {}", results.len()));
        progress.say(format!("Total jobs found: {jobs_found}"));
        progress.say(format!("Results saved to {}", output_file.display()));

        Ok(RunSummary {
            success: true,
            companies_scraped: results.len(),
            jobs_found,
            cancelled,
            output_file,
            backup_file: backup.map(|b| b.path),
            results,
        })
    }

    async fn resolve_companies(
        &self,
        filters: &CompanyFilters,
        limit: usize,
        progress: &mut Progress<'_>,
    ) -> Result<Vec<CompanyRecord>, RunError> {
        let primary = self.feed.primary_url();
        progress.say(format!("Fetching {limit} companies from {primary}..."));
        if !filters.is_empty() {
            progress.say(format!("Filters: {}", filters.describe()));
        }
        progress.say(format!("Trying local API: {primary}..."));

        let resolution = match resolve(&self.feed, filters, limit).await {
            Ok(resolution) => resolution,
            Err(e) => {
                progress.say("Local API failed, falling back to static YC data source...");
                progress.say(format!("All data sources failed: {}", e.fallback));
                return Err(e.into());
            }
        };
        if resolution.origin == SourceOrigin::Fallback {
            progress.say("Local API failed, falling back to static YC data source...");
        }

        progress.say(format!(
            "Found {} companies. Starting scrape...",
            resolution.companies.len()
        ));
        if let (Some(pick), Some(query)) = (&resolution.pick, filters.name_query()) {
            progress.say(format!("Searching for company: \"{query}\""));
            match pick {
                NamePick::Exact(name) => progress.say(format!("Found exact match: {name}")),
                NamePick::Closest(name) => progress.say(format!("Using closest match: {name}")),
            }
        }
        Ok(resolution.companies)
    }

    /// The per-company loop. Returns the results, the job total and whether
    /// the run was cancelled before the last company.
    async fn scrape_companies(
        &self,
        session: &L::Session,
        store: &ResultsStore,
        companies: &[CompanyRecord],
        progress: &mut Progress<'_>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<CompanyScrapeResult>, usize, bool), RunError> {
        let total = companies.len();
        let mut results = Vec::with_capacity(total);
        let mut jobs_found = 0;

        for (i, company) in companies.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok((results, jobs_found, true));
            }
            progress.say(format!("[{}/{total}] Scraping {}...", i + 1, company.name));

            let result = match self.scrape_company(session, company).await {
                Ok(result) => result,
                Err(message) => CompanyScrapeResult::failed(company, message),
            };
            let job_count = result.jobs.len();
            let error = result.error.clone();
            results.push(result);
            jobs_found += job_count;
            store.persist(&results)?;

            match error {
                None => progress.say(format!("   ✓ Found {job_count} jobs. Saved to file.")),
                Some(e) => progress.say(format!("   ✗ Failed to scrape {}: {e}", company.name)),
            }
        }
        Ok((results, jobs_found, false))
    }

    /// Scrape one company on a fresh page. The page is closed on every path;
    /// the error string becomes the company's recorded error.
    async fn scrape_company(
        &self,
        session: &L::Session,
        company: &CompanyRecord,
    ) -> Result<CompanyScrapeResult, String> {
        let page = session.new_page().await.map_err(|e| e.to_string())?;
        let url = company.jobs_url();
        let board = extract_jobs(
            &page,
            &url,
            self.config.navigation_timeout,
            &self.config.site_origin,
        )
        .await;
        if let Err(e) = page.close().await {
            warn!(company = %company.name, error = %e, "failed to close page");
        }

        let board = board.map_err(|e| e.to_string())?;
        Ok(CompanyScrapeResult::succeeded(company, board.into_jobs()))
    }
}

async fn close_session<S: BrowserSession>(session: S) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser");
    }
}
