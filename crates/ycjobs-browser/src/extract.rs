//! Per-company extraction: navigate, wait, parse.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::board::{JobBoard, parse_job_board};
use crate::{BrowserError, JobPage};

/// Load `url` in `page` and parse its job board.
///
/// Navigation and the wait for the board to render share `timeout`, which
/// holds even if the page implementation ignores it. A board that never shows
/// cards or the no-jobs notice is parsed as it stands. Cards that fail to
/// parse are logged and left out; they do not fail the company.
pub async fn extract_jobs<P>(
    page: &P,
    url: &str,
    timeout: Duration,
    origin: &str,
) -> Result<JobBoard, BrowserError>
where
    P: JobPage + ?Sized,
{
    debug!(url, "navigating to job board");
    let started = Instant::now();
    match tokio::time::timeout(timeout, page.goto(url, timeout)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(BrowserError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            });
        }
    }

    let remaining = timeout.saturating_sub(started.elapsed());
    match tokio::time::timeout(remaining, page.wait_for_board(remaining)).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) | Err(_) => debug!(url, "job board did not finish rendering"),
        Ok(Err(e)) => return Err(e),
    }

    let html = page.content().await?;
    let board = parse_job_board(&html, origin);
    for skipped in board.skipped() {
        warn!(url, error = %skipped, "failed to parse a job card");
    }
    debug!(url, jobs = board.jobs().len(), "parsed job board");
    Ok(board)
}
