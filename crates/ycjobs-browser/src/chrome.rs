//! Chrome-backed pages via the DevTools protocol.
//!
//! `headless_chrome` is blocking, so every call hops onto the blocking pool.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::{BrowserError, BrowserLauncher, BrowserSession, JobPage};

/// Chrome shuts itself down after this long without DevTools traffic. Runs
/// can sit on one page for a while, so keep it well above the navigation
/// timeout.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// Launches a local Chrome or Chromium.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
}

impl ChromeLauncher {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, BrowserError> {
        let headless = self.headless;
        let browser = spawn_blocking(move || {
            let options = LaunchOptions {
                headless,
                idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
                args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
                ..Default::default()
            };
            Browser::new(options)
        })
        .await?
        .map_err(|e| BrowserError::Launch(e.to_string()))?;
        info!(headless, "browser launched");
        Ok(ChromeSession {
            browser: Arc::new(browser),
        })
    }
}

pub struct ChromeSession {
    browser: Arc<Browser>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = ChromePage;

    async fn new_page(&self) -> Result<ChromePage, BrowserError> {
        let browser = Arc::clone(&self.browser);
        let tab = spawn_blocking(move || browser.new_tab())
            .await?
            .map_err(|e| BrowserError::Page(e.to_string()))?;
        Ok(ChromePage { tab })
    }

    async fn close(self) -> Result<(), BrowserError> {
        // The Chrome process is killed when the last handle drops.
        spawn_blocking(move || drop(self.browser)).await?;
        debug!("browser closed");
        Ok(())
    }
}

pub struct ChromePage {
    tab: Arc<Tab>,
}

#[async_trait]
impl JobPage for ChromePage {
    /// Waits for the load event only. Cards rendered after it are awaited by
    /// [`JobPage::wait_for_board`].
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        spawn_blocking(move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&target)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await?
        .map_err(|message| BrowserError::Navigation {
            url: url.to_string(),
            message,
        })
    }

    async fn content(&self) -> Result<String, BrowserError> {
        let tab = Arc::clone(&self.tab);
        spawn_blocking(move || tab.get_content())
            .await?
            .map_err(|e| BrowserError::Content(e.to_string()))
    }

    async fn close(self) -> Result<(), BrowserError> {
        let tab = self.tab;
        spawn_blocking(move || tab.close(true))
            .await?
            .map_err(|e| BrowserError::Page(e.to_string()))?;
        Ok(())
    }
}
