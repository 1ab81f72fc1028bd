//! Browser seams: one launcher per process, one session per run, one page
//! per company.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};

use crate::BrowserError;
use crate::board::board_rendered;

/// How often [`JobPage::wait_for_board`] re-reads the DOM.
pub const BOARD_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Starts a browser for one scrape run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session, BrowserError>;
}

/// A running browser. Pages are opened one at a time.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Page: JobPage;

    async fn new_page(&self) -> Result<Self::Page, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>
    where
        Self: Sized;
}

/// A single browsing context used for one company's job board.
#[async_trait]
pub trait JobPage: Send + Sync {
    /// Navigate to `url` and wait for the page to settle, giving up after
    /// `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Serialized DOM of the current document.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Wait until the document shows job cards or the no-jobs notice.
    ///
    /// Returns `false` if neither appeared within `timeout`. Boards render
    /// client-side, so the load event alone does not mean the cards are there.
    async fn wait_for_board(&self, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if board_rendered(&self.content().await?) {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            sleep(BOARD_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn close(self) -> Result<(), BrowserError>
    where
        Self: Sized;
}
