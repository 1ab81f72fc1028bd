//! Job postings and per-company scrape results.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::CompanyRecord;

/// A single open role extracted from a company's job board.
///
/// Salary and equity are opaque display strings, never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub equity: String,
    /// Absolute application link, empty if the card had none.
    #[serde(default)]
    pub url: String,
}

/// Outcome of scraping one company.
///
/// Either carries the extracted `jobs`, or an empty `jobs` list and an
/// `error` message. Use [`succeeded`](Self::succeeded) and
/// [`failed`](Self::failed) to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScrapeResult {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub url: String,
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp string.
    pub scraped_at: String,
}

impl CompanyScrapeResult {
    pub fn succeeded(company: &CompanyRecord, jobs: Vec<JobRecord>) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            slug: company.slug.clone(),
            url: company.url.clone(),
            jobs,
            error: None,
            scraped_at: now_iso(),
        }
    }

    pub fn failed(company: &CompanyRecord, error: impl Into<String>) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            slug: company.slug.clone(),
            url: company.url.clone(),
            jobs: Vec::new(),
            error: Some(error.into()),
            scraped_at: now_iso(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
