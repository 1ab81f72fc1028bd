//! Scrape orchestration: resolve companies, drive the browser through each
//! job board, persist after every company, and report progress.

mod error;
pub use error::RunError;

pub mod progress;
pub use progress::{
    CallbackReporter, ChannelReporter, NullReporter, ProgressEvent, ProgressReporter, RunSummary,
};

pub mod scrape;
pub use scrape::{ScrapeRequest, Scraper};

pub use tokio_util::sync::CancellationToken;
