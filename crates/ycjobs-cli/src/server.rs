//! HTTP API: the company directory the scraper reads from, plus endpoints to
//! run scrapes and read their output.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};
use ycjobs_browser::BrowserLauncher;
use ycjobs_core::{DirectoryPage, DirectoryQuery, Limit};
use ycjobs_runner::{
    CancellationToken, ChannelReporter, NullReporter, ProgressEvent, ProgressReporter,
    ScrapeRequest, Scraper,
};
use ycjobs_source::{CompanyFeed, SnapshotCache};
use ycjobs_store::ResultsStore;

/// Company count used when an HTTP caller doesn't pass `limit`.
pub const HTTP_DEFAULT_LIMIT: usize = 10;

/// Where the directory endpoints read their companies from.
#[derive(Debug, Clone)]
pub struct DirectorySources {
    pub hiring_url: String,
    pub all_url: String,
}

/// Shared handler state.
///
/// The results store sits behind a mutex: whoever holds the guard is the
/// only run writing the output file.
pub struct AppState<F, L> {
    scraper: Arc<Scraper<F, L>>,
    store: Arc<Mutex<ResultsStore>>,
    reader: ResultsStore,
    snapshots: Arc<SnapshotCache>,
    sources: Arc<DirectorySources>,
    queue: mpsc::UnboundedSender<ScrapeRequest>,
    queued: Arc<AtomicUsize>,
}

impl<F, L> Clone for AppState<F, L> {
    fn clone(&self) -> Self {
        Self {
            scraper: Arc::clone(&self.scraper),
            store: Arc::clone(&self.store),
            reader: self.reader.clone(),
            snapshots: Arc::clone(&self.snapshots),
            sources: Arc::clone(&self.sources),
            queue: self.queue.clone(),
            queued: Arc::clone(&self.queued),
        }
    }
}

impl<F, L> AppState<F, L>
where
    F: CompanyFeed + 'static,
    L: BrowserLauncher + 'static,
{
    /// Build the state and start the background worker that serves
    /// `POST /api/scraper/start`. Must be called inside a Tokio runtime.
    pub fn new(
        scraper: Scraper<F, L>,
        store: ResultsStore,
        snapshots: SnapshotCache,
        sources: DirectorySources,
    ) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let state = Self {
            scraper: Arc::new(scraper),
            reader: store.clone(),
            store: Arc::new(Mutex::new(store)),
            snapshots: Arc::new(snapshots),
            sources: Arc::new(sources),
            queue,
            queued: Arc::new(AtomicUsize::new(0)),
        };
        tokio::spawn(run_queue(state.clone(), rx));
        state
    }
}

pub fn router<F, L>(state: AppState<F, L>) -> Router
where
    F: CompanyFeed + 'static,
    L: BrowserLauncher + 'static,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/hiring", get(hiring::<F, L>))
        .route("/api/all", get(all_companies::<F, L>))
        .route("/api/scraper/stream", get(stream::<F, L>))
        .route("/api/scraper/start", post(start::<F, L>))
        .route("/api/scraper/results", get(results::<F, L>))
        .with_state(state)
}

pub async fn serve<F, L>(bind: &str, state: AppState<F, L>) -> anyhow::Result<()>
where
    F: CompanyFeed + 'static,
    L: BrowserLauncher + 'static,
{
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "ycjobs API listening");
    axum::serve(listener, router(state))
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

// ── Directory ──

type ApiError = (StatusCode, Json<Value>);

async fn directory_page<F, L>(
    state: &AppState<F, L>,
    url: &str,
    query: &DirectoryQuery,
    failure: &str,
) -> Result<Json<DirectoryPage>, ApiError> {
    match state.snapshots.get(url).await {
        Ok(companies) => Ok(Json(query.run(&companies))),
        Err(e) => {
            error!(url, error = %e, "directory snapshot fetch failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": failure })),
            ))
        }
    }
}

async fn hiring<F, L>(
    State(state): State<AppState<F, L>>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<DirectoryPage>, ApiError> {
    let url = state.sources.hiring_url.clone();
    directory_page(&state, &url, &query, "Failed to fetch hiring data").await
}

async fn all_companies<F, L>(
    State(state): State<AppState<F, L>>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<DirectoryPage>, ApiError> {
    let url = state.sources.all_url.clone();
    directory_page(&state, &url, &query, "Failed to fetch YC data").await
}

// ── Scraper ──

fn with_http_default(mut request: ScrapeRequest) -> ScrapeRequest {
    request.limit.get_or_insert(Limit::Count(HTTP_DEFAULT_LIMIT));
    request
}

/// Run a scrape and stream its progress as server-sent events. Closing the
/// connection cancels the run at the next company boundary.
async fn stream<F, L>(
    State(state): State<AppState<F, L>>,
    Query(request): Query<ScrapeRequest>,
) -> Response
where
    F: CompanyFeed + 'static,
    L: BrowserLauncher + 'static,
{
    let request = with_http_default(request);
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let mut reporter = ChannelReporter::new(tx).cancel_on_close(cancel.clone());

    match Arc::clone(&state.store).try_lock_owned() {
        Ok(mut store) => {
            let scraper = Arc::clone(&state.scraper);
            tokio::spawn(async move {
                let outcome = scraper
                    .run_and_report(&mut store, &request, &mut reporter, &cancel)
                    .await;
                log_outcome("stream", outcome.map(|s| (s.companies_scraped, s.jobs_found)));
            });
        }
        Err(_) => {
            warn!("scrape requested while another run holds the results file");
            reporter.report(ProgressEvent::Error(
                "A scrape is already running. Try again when it finishes.".into(),
            ));
        }
    }

    let frames = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.to_sse_frame()));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct Queued {
    message: &'static str,
    status: &'static str,
    position: usize,
}

/// Queue a scrape for the background worker and return immediately.
async fn start<F, L>(
    State(state): State<AppState<F, L>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<Queued>, ApiError> {
    let request = with_http_default(request);
    let position = state.queued.fetch_add(1, Ordering::SeqCst) + 1;
    if state.queue.send(request).is_err() {
        state.queued.fetch_sub(1, Ordering::SeqCst);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to start scraper", "details": "worker stopped" })),
        ));
    }
    info!(position, "scrape queued");
    Ok(Json(Queued {
        message: "Scraper queued. Progress is written to the server log.",
        status: "queued",
        position,
    }))
}

/// Runs queued scrapes one after another, waiting for any streamed run to
/// release the results file first.
async fn run_queue<F, L>(state: AppState<F, L>, mut rx: mpsc::UnboundedReceiver<ScrapeRequest>)
where
    F: CompanyFeed + 'static,
    L: BrowserLauncher + 'static,
{
    while let Some(request) = rx.recv().await {
        let mut store = state.store.lock().await;
        state.queued.fetch_sub(1, Ordering::SeqCst);
        let outcome = state
            .scraper
            .run_and_report(&mut store, &request, &mut NullReporter, &CancellationToken::new())
            .await;
        log_outcome("queue", outcome.map(|s| (s.companies_scraped, s.jobs_found)));
    }
}

fn log_outcome<E: std::fmt::Display>(origin: &str, outcome: Result<(usize, usize), E>) {
    match outcome {
        Ok((companies, jobs)) => info!(origin, companies, jobs, "scrape finished"),
        Err(e) => error!(origin, error = %e, "scrape failed"),
    }
}

async fn results<F, L>(State(state): State<AppState<F, L>>) -> (StatusCode, Json<Value>) {
    match state.reader.read() {
        Ok(data) => (StatusCode::OK, Json(json!({ "data": data }))),
        Err(e) => {
            error!(path = %state.reader.jobs_file().display(), error = %e, "failed to read results");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "data": [], "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use ycjobs_browser::{BrowserError, BrowserSession, JobPage};
    use ycjobs_core::{CompanyFilters, CompanyRecord, CompanyScrapeResult, ScraperConfig};
    use ycjobs_source::{SNAPSHOT_TTL, SourceError};

    struct OneCompany;

    #[async_trait]
    impl CompanyFeed for OneCompany {
        fn primary_url(&self) -> &str {
            "http://fake/api/hiring"
        }

        async fn fetch_filtered(
            &self,
            _filters: &CompanyFilters,
            _limit: usize,
        ) -> Result<Vec<CompanyRecord>, SourceError> {
            Ok(vec![CompanyRecord {
                id: 7,
                name: "Acme".into(),
                url: "https://www.ycombinator.com/companies/acme".into(),
                ..Default::default()
            }])
        }

        async fn fetch_snapshot(&self) -> Result<Vec<CompanyRecord>, SourceError> {
            Ok(vec![])
        }
    }

    /// Every page says there are no openings.
    struct EmptyBoards;
    struct EmptySession;
    struct EmptyPage;

    #[async_trait]
    impl BrowserLauncher for EmptyBoards {
        type Session = EmptySession;
        async fn launch(&self) -> Result<EmptySession, BrowserError> {
            Ok(EmptySession)
        }
    }

    #[async_trait]
    impl BrowserSession for EmptySession {
        type Page = EmptyPage;
        async fn new_page(&self) -> Result<EmptyPage, BrowserError> {
            Ok(EmptyPage)
        }
        async fn close(self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    #[async_trait]
    impl JobPage for EmptyPage {
        async fn goto(&self, _url: &str, _timeout: Duration) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn content(&self) -> Result<String, BrowserError> {
            Ok("<p>No jobs at Acme</p>".into())
        }
        async fn close(self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    async fn spawn_app(tmp: &TempDir) -> (String, AppState<OneCompany, EmptyBoards>) {
        let config = ScraperConfig {
            results_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        let store = ResultsStore::from_config(&config);
        let state = AppState::new(
            Scraper::new(config, OneCompany, EmptyBoards),
            store,
            SnapshotCache::new(SNAPSHOT_TTL).unwrap(),
            DirectorySources {
                hiring_url: "http://127.0.0.1:9/hiring.json".into(),
                all_url: "http://127.0.0.1:9/all.json".into(),
            },
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), state)
    }

    fn frames(body: &str) -> Vec<Value> {
        body.split("\n\n")
            .filter(|f| !f.is_empty())
            .map(|f| serde_json::from_str(f.strip_prefix("data: ").unwrap()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let tmp = TempDir::new().unwrap();
        let (base, _) = spawn_app(&tmp).await;
        let body = reqwest::get(format!("{base}/healthz")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn stream_emits_progress_then_complete() {
        let tmp = TempDir::new().unwrap();
        let (base, _) = spawn_app(&tmp).await;

        let resp = reqwest::get(format!("{base}/api/scraper/stream?limit=5"))
            .await
            .unwrap();
        assert_eq!(
            resp.headers()[reqwest::header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(resp.headers()[reqwest::header::CACHE_CONTROL], "no-cache");
        let frames = frames(&resp.text().await.unwrap());

        assert_eq!(frames[0]["message"], "--- YC Job Scraper Bot started ---");
        assert!(frames.iter().any(|f| f["message"] == "Fetching 5 companies from http://fake/api/hiring..."));
        let last = frames.last().unwrap();
        assert_eq!(last["type"], "complete");
        assert_eq!(last["companiesScraped"], 1);
        assert_eq!(last["jobsFound"], 0);
        assert_eq!(frames.iter().filter(|f| f.get("type").is_some()).count(), 1);
    }

    #[tokio::test]
    async fn stream_refuses_concurrent_run() {
        let tmp = TempDir::new().unwrap();
        let (base, state) = spawn_app(&tmp).await;
        let _held = state.store.lock().await;

        let body = reqwest::get(format!("{base}/api/scraper/stream"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let frames = frames(&body);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "error");
    }

    #[tokio::test]
    async fn start_queues_and_worker_writes_results() {
        let tmp = TempDir::new().unwrap();
        let (base, state) = spawn_app(&tmp).await;

        let resp: Value = reqwest::Client::new()
            .post(format!("{base}/api/scraper/start"))
            .json(&json!({ "limit": 1 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp["status"], "queued");
        assert_eq!(resp["position"], 1);

        for _ in 0..100 {
            if state.reader.jobs_file().exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let written: Vec<CompanyScrapeResult> = state.reader.read().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, 7);
    }

    #[tokio::test]
    async fn results_reads_output_file() {
        let tmp = TempDir::new().unwrap();
        let (base, state) = spawn_app(&tmp).await;

        let empty: Value = reqwest::get(format!("{base}/api/scraper/results"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(empty, json!({ "data": [] }));

        std::fs::write(state.reader.jobs_file(), "[oops").unwrap();
        let resp = reqwest::get(format!("{base}/api/scraper/results")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"], json!([]));
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn directory_upstream_failure_is_500() {
        let tmp = TempDir::new().unwrap();
        let (base, _) = spawn_app(&tmp).await;

        let resp = reqwest::get(format!("{base}/api/hiring?year=2024")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Failed to fetch hiring data" }));

        let resp = reqwest::get(format!("{base}/api/all")).await.unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Failed to fetch YC data" }));
    }

    #[test]
    fn http_limit_defaults_to_ten() {
        let request = with_http_default(ScrapeRequest::default());
        assert_eq!(request.limit, Some(Limit::Count(10)));
        let request = with_http_default(ScrapeRequest {
            limit: Some(Limit::All),
            ..Default::default()
        });
        assert_eq!(request.limit, Some(Limit::All));
    }
}
