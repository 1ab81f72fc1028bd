//! Company records as published by the startup directory.

use serde::{Deserialize, Deserializer, Serialize};

/// One startup directory entry.
///
/// Sourced externally and never mutated during a scrape run. Only the
/// identity fields (`id`, `name`, `slug`, `url`) are used to address job
/// pages; the rest feed the filter predicates and the directory API.
///
/// Upstream snapshots are loosely typed: any field may be missing or `null`,
/// so every field falls back to its default instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub former_names: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub small_logo_thumb_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(deserialize_with = "null_as_default")]
    pub all_locations: String,
    #[serde(deserialize_with = "null_as_default")]
    pub long_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub one_liner: String,
    pub team_size: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub industry: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subindustry: String,
    /// Unix seconds.
    pub launched_at: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags_highlighted: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub top_company: bool,
    #[serde(rename = "isHiring", deserialize_with = "null_as_default")]
    pub is_hiring: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub nonprofit: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub batch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub industries: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub regions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,
    /// Canonical profile URL; the job board lives at `{url}/jobs`.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub api: String,
}

impl CompanyRecord {
    /// URL of the company's job board.
    pub fn jobs_url(&self) -> String {
        format!("{}/jobs", self.url.trim_end_matches('/'))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
