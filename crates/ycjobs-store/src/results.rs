//! The scrape output file and its per-run backup snapshots.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use ycjobs_core::{CompanyScrapeResult, ScraperConfig};

use crate::StoreError;
use crate::json::{load_json, read_json, save_json};

/// A copy of the previous output, written once per run before the first
/// overwrite. Backups are never overwritten or pruned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub entries: usize,
}

/// Owner of the output collection on disk.
///
/// Every write is a full-collection replace. Only one run may hold a
/// `ResultsStore` for a given path at a time; the store itself takes no lock,
/// so callers hand it to one run at a time.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    jobs_file: PathBuf,
    backup_dir: PathBuf,
}

impl ResultsStore {
    pub fn new(jobs_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_file: jobs_file.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.jobs_file(), config.backup_dir())
    }

    pub fn jobs_file(&self) -> &Path {
        &self.jobs_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The persisted collection, or an empty list if the file is missing or
    /// unreadable.
    pub fn load(&self) -> Vec<CompanyScrapeResult> {
        load_json(&self.jobs_file).unwrap_or_default()
    }

    /// Like [`load`](Self::load), but an unreadable or corrupt file is an
    /// error rather than an empty list.
    pub fn read(&self) -> Result<Vec<CompanyScrapeResult>, StoreError> {
        Ok(read_json(&self.jobs_file)?.unwrap_or_default())
    }

    /// Copy the current output to a timestamped file under the backup
    /// directory. Does nothing and returns `None` when there is no existing
    /// data.
    ///
    /// Entries are copied as raw JSON so records written by older versions
    /// survive unchanged.
    pub fn backup_existing(&self, now: DateTime<Utc>) -> Result<Option<BackupSnapshot>, StoreError> {
        let existing: Vec<Value> = match load_json(&self.jobs_file) {
            Some(entries) => entries,
            None => return Ok(None),
        };
        if existing.is_empty() {
            return Ok(None);
        }

        let path = self.unused_backup_path(now);
        save_json(&existing, &path)?;
        info!(path = %path.display(), entries = existing.len(), "backed up existing results");
        Ok(Some(BackupSnapshot {
            path,
            entries: existing.len(),
        }))
    }

    /// Replace the output file with `results`.
    pub fn persist(&self, results: &[CompanyScrapeResult]) -> Result<(), StoreError> {
        save_json(results, &self.jobs_file)
    }

    fn unused_backup_path(&self, now: DateTime<Utc>) -> PathBuf {
        let name = backup_file_name(now);
        let first = self.backup_dir.join(&name);
        if !first.exists() {
            return first;
        }
        let stem = name.trim_end_matches(".json");
        (1..)
            .map(|n| self.backup_dir.join(format!("{stem}-{n}.json")))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }
}

/// `jobs-<timestamp>.json` with a sortable, filesystem-safe UTC timestamp
/// such as `2025-03-14T09-26-53`.
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("jobs-{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}
