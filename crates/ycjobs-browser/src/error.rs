use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open page: {0}")]
    Page(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("navigation to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("failed to read page content: {0}")]
    Content(String),

    #[error("browser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A job card whose markup didn't match the expected structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardParseError {
    #[error("job card {index} has no title link")]
    MissingTitle { index: usize },
}
