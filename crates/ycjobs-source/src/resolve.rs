//! Company resolution: primary source first, static snapshot as fallback,
//! then an optional collapse to a single company by name.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use ycjobs_core::{CompanyFilters, CompanyRecord};

use crate::SourceError;

/// A place companies can be fetched from.
///
/// `fetch_filtered` is trusted to apply the filters server-side;
/// `fetch_snapshot` returns everything and is filtered locally.
#[async_trait]
pub trait CompanyFeed: Send + Sync {
    /// Where the primary source lives, for progress reporting.
    fn primary_url(&self) -> &str;

    async fn fetch_filtered(
        &self,
        filters: &CompanyFilters,
        limit: usize,
    ) -> Result<Vec<CompanyRecord>, SourceError>;

    async fn fetch_snapshot(&self) -> Result<Vec<CompanyRecord>, SourceError>;
}

/// Both company sources failed; the run cannot start.
#[derive(Error, Debug)]
#[error("all company sources failed (primary: {primary}; fallback: {fallback})")]
pub struct SourceUnavailable {
    pub primary: SourceError,
    pub fallback: SourceError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Primary,
    Fallback,
}

/// How a name query narrowed the list to one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePick {
    /// A company's name equals the query, ignoring case.
    Exact(String),
    /// No exact match; the first candidate was taken.
    Closest(String),
}

/// The companies a run will scrape, in scrape order.
#[derive(Debug)]
pub struct Resolution {
    pub companies: Vec<CompanyRecord>,
    pub origin: SourceOrigin,
    /// Why the primary source was skipped, when it was.
    pub primary_error: Option<SourceError>,
    pub pick: Option<NamePick>,
}

/// Resolve the list of companies to scrape.
///
/// Tries the primary source with `filters` and `limit`; on any failure falls
/// back to the snapshot, filtered and truncated locally. A non-empty name
/// query then collapses the list to one company: an exact case-insensitive
/// name match if there is one, otherwise the first candidate.
pub async fn resolve<F>(
    feed: &F,
    filters: &CompanyFilters,
    limit: usize,
) -> Result<Resolution, SourceUnavailable>
where
    F: CompanyFeed + ?Sized,
{
    let (mut companies, origin, primary_error) = match feed.fetch_filtered(filters, limit).await {
        Ok(companies) => (companies, SourceOrigin::Primary, None),
        Err(primary) => {
            warn!(error = %primary, "primary company source failed, using snapshot");
            match feed.fetch_snapshot().await {
                Ok(all) => {
                    let filtered = filters.apply(all, limit);
                    (filtered, SourceOrigin::Fallback, Some(primary))
                }
                Err(fallback) => return Err(SourceUnavailable { primary, fallback }),
            }
        }
    };

    let pick = match filters.name_query() {
        Some(query) if !companies.is_empty() => Some(collapse_to_name(&mut companies, query)),
        _ => None,
    };

    info!(count = companies.len(), ?origin, "resolved companies");
    Ok(Resolution {
        companies,
        origin,
        primary_error,
        pick,
    })
}

/// Keep exactly one company from a non-empty list.
fn collapse_to_name(companies: &mut Vec<CompanyRecord>, query: &str) -> NamePick {
    let query = query.to_lowercase();
    let exact = companies
        .iter()
        .position(|c| c.name.to_lowercase() == query);

    let (index, pick) = match exact {
        Some(i) => (i, NamePick::Exact(companies[i].name.clone())),
        None => (0, NamePick::Closest(companies[0].name.clone())),
    };
    let chosen = companies.swap_remove(index);
    companies.clear();
    companies.push(chosen);
    pick
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory feed with switchable failures.
    struct FakeFeed {
        primary: Option<Vec<CompanyRecord>>,
        snapshot: Option<Vec<CompanyRecord>>,
        snapshot_calls: AtomicUsize,
    }

    fn server_error() -> SourceError {
        SourceError::Server {
            status: 503,
            body: "unavailable".into(),
        }
    }

    #[async_trait]
    impl CompanyFeed for FakeFeed {
        fn primary_url(&self) -> &str {
            "http://fake/api/hiring"
        }

        async fn fetch_filtered(
            &self,
            _filters: &CompanyFilters,
            _limit: usize,
        ) -> Result<Vec<CompanyRecord>, SourceError> {
            self.primary.clone().ok_or_else(server_error)
        }

        async fn fetch_snapshot(&self) -> Result<Vec<CompanyRecord>, SourceError> {
            self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
            self.snapshot.clone().ok_or_else(server_error)
        }
    }

    fn feed(
        primary: Option<Vec<CompanyRecord>>,
        snapshot: Option<Vec<CompanyRecord>>,
    ) -> FakeFeed {
        FakeFeed {
            primary,
            snapshot,
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    fn company(id: i64, name: &str, batch: &str) -> CompanyRecord {
        CompanyRecord {
            id,
            name: name.into(),
            batch: batch.into(),
            ..Default::default()
        }
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.companies.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn primary_result_used_as_is() {
        let primary = vec![company(1, "A", "W21"), company(2, "B", "S09")];
        let feed = feed(Some(primary), None);
        let filters = CompanyFilters {
            year: Some("2024".into()),
            ..Default::default()
        };

        let resolution = resolve(&feed, &filters, 1).await.unwrap();
        assert_eq!(resolution.origin, SourceOrigin::Primary);
        assert_eq!(names(&resolution), ["A", "B"]);
        assert_eq!(feed.snapshot_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_filters_and_truncates_in_order() {
        let snapshot = vec![
            company(1, "A", "Summer 2024"),
            company(2, "B", "Winter 2019"),
            company(3, "C", "W24"),
            company(4, "D", "S24"),
            company(5, "E", "Summer 2024"),
        ];
        let feed = feed(None, Some(snapshot));
        let filters = CompanyFilters {
            year: Some("2024".into()),
            ..Default::default()
        };

        let resolution = resolve(&feed, &filters, 3).await.unwrap();
        assert_eq!(resolution.origin, SourceOrigin::Fallback);
        assert!(resolution.primary_error.is_some());
        assert_eq!(names(&resolution), ["A", "C", "D"]);
    }

    #[tokio::test]
    async fn fallback_limit_without_filters() {
        let snapshot: Vec<_> = (0..10).map(|i| company(i, &format!("C{i}"), "")).collect();
        let feed = feed(None, Some(snapshot));
        let resolution = resolve(&feed, &CompanyFilters::default(), 4).await.unwrap();
        assert_eq!(names(&resolution), ["C0", "C1", "C2", "C3"]);
    }

    #[tokio::test]
    async fn both_sources_failing_is_unavailable() {
        let feed = feed(None, None);
        let err = resolve(&feed, &CompanyFilters::default(), 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all company sources failed"));
    }

    #[tokio::test]
    async fn exact_name_query_collapses_to_match() {
        let primary = vec![
            company(1, "Stripe Atlas", ""),
            company(2, "Stripe", ""),
            company(3, "Stripey", ""),
        ];
        let feed = feed(Some(primary), None);
        let filters = CompanyFilters {
            query: Some("stripe".into()),
            ..Default::default()
        };

        let resolution = resolve(&feed, &filters, 10).await.unwrap();
        assert_eq!(names(&resolution), ["Stripe"]);
        assert_eq!(resolution.pick, Some(NamePick::Exact("Stripe".into())));
    }

    #[tokio::test]
    async fn partial_name_query_takes_first() {
        let snapshot = vec![
            company(1, "Airbnb", ""),
            company(2, "Dropbox", ""),
            company(3, "Dropbox Paper", ""),
        ];
        let feed = feed(None, Some(snapshot));
        let filters = CompanyFilters {
            query: Some("drop".into()),
            ..Default::default()
        };

        let resolution = resolve(&feed, &filters, 10).await.unwrap();
        assert_eq!(names(&resolution), ["Dropbox"]);
        assert_eq!(resolution.pick, Some(NamePick::Closest("Dropbox".into())));
    }

    #[tokio::test]
    async fn name_query_with_no_candidates_stays_empty() {
        let feed = feed(None, Some(vec![company(1, "Airbnb", "")]));
        let filters = CompanyFilters {
            query: Some("nomatch".into()),
            ..Default::default()
        };
        let resolution = resolve(&feed, &filters, 10).await.unwrap();
        assert!(resolution.companies.is_empty());
        assert_eq!(resolution.pick, None);
    }
}
