//! Time-bounded cache of upstream company snapshots for the directory API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;
use ycjobs_core::CompanyRecord;

use crate::SourceError;
use crate::http::get_json;

/// How long a fetched snapshot is served before it is refetched.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(3600);

type Entry = (Instant, Arc<Vec<CompanyRecord>>);

/// Caches each snapshot URL's company list for [`SNAPSHOT_TTL`].
pub struct SnapshotCache {
    client: reqwest::Client,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            ttl,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// The company list at `url`, fetched at most once per TTL.
    pub async fn get(&self, url: &str) -> Result<Arc<Vec<CompanyRecord>>, SourceError> {
        if let Some(companies) = self.fresh(url).await {
            debug!(url, "snapshot cache hit");
            return Ok(companies);
        }

        let companies: Vec<CompanyRecord> = get_json(&self.client, url, &[]).await?;
        let companies = Arc::new(companies);
        self.entries
            .write()
            .await
            .insert(url.to_string(), (Instant::now(), Arc::clone(&companies)));
        debug!(url, count = companies.len(), "snapshot cached");
        Ok(companies)
    }

    async fn fresh(&self, url: &str) -> Option<Arc<Vec<CompanyRecord>>> {
        let entries = self.entries.read().await;
        entries
            .get(url)
            .filter(|(fetched, _)| fetched.elapsed() < self.ttl)
            .map(|(_, companies)| Arc::clone(companies))
    }

    #[cfg(test)]
    async fn seed(&self, url: &str, fetched: Instant, companies: Vec<CompanyRecord>) {
        self.entries
            .write()
            .await
            .insert(url.to_string(), (fetched, Arc::new(companies)));
    }
}
