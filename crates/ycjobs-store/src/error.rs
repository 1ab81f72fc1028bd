use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: std::path::PathBuf,
        source: tempfile::PersistError,
    },
}
