//! Storage layer: atomic JSON files for the scrape output and its backups.

mod error;
pub use error::StoreError;

pub mod json;
pub use json::{load_json, read_json, save_json};

mod results;
pub use results::{BackupSnapshot, ResultsStore, backup_file_name};
