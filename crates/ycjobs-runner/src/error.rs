use thiserror::Error;
use ycjobs_browser::BrowserError;
use ycjobs_source::SourceUnavailable;
use ycjobs_store::StoreError;

/// Failures that end a run. Per-company failures are recorded in the
/// results instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    SourceUnavailable(#[from] SourceUnavailable),

    #[error("browser launch failed: {0}")]
    BrowserLaunch(#[source] BrowserError),

    #[error("failed to write results: {0}")]
    Store(#[from] StoreError),
}
