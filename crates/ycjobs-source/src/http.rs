//! HTTP company feed: the filter-aware primary API and the static snapshot.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use ycjobs_core::{CompanyFilters, CompanyRecord};

use crate::resolve::CompanyFeed;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Company feed backed by two HTTP endpoints.
pub struct HttpCompanyFeed {
    client: reqwest::Client,
    api_url: String,
    snapshot_url: String,
}

/// Body of a successful primary-source response.
#[derive(Deserialize)]
struct PrimaryResponse {
    companies: Vec<CompanyRecord>,
}

impl HttpCompanyFeed {
    /// Create a feed for the given primary API and snapshot URLs.
    ///
    /// `api_url` should be the full endpoint, like
    /// `http://127.0.0.1:3000/api/hiring` (no query string).
    pub fn new(api_url: String, snapshot_url: String) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            snapshot_url,
        })
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// GET `url` and decode the JSON body, mapping non-2xx statuses to
/// [`SourceError::Server`].
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, SourceError> {
    let resp = client.get(url).query(query).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SourceError::Server {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl CompanyFeed for HttpCompanyFeed {
    fn primary_url(&self) -> &str {
        &self.api_url
    }

    async fn fetch_filtered(
        &self,
        filters: &CompanyFilters,
        limit: usize,
    ) -> Result<Vec<CompanyRecord>, SourceError> {
        let query = filters.query_pairs(limit);
        info!(url = %self.api_url, limit, "fetching companies from primary source");
        let body: PrimaryResponse = get_json(self.client(), &self.api_url, &query).await?;
        info!(count = body.companies.len(), "primary source returned companies");
        Ok(body.companies)
    }

    async fn fetch_snapshot(&self) -> Result<Vec<CompanyRecord>, SourceError> {
        info!(url = %self.snapshot_url, "fetching static company snapshot");
        let companies: Vec<CompanyRecord> = get_json(self.client(), &self.snapshot_url, &[]).await?;
        info!(count = companies.len(), "snapshot returned companies");
        Ok(companies)
    }
}
