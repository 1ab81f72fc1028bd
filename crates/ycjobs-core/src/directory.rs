//! Read-side directory query: filter, rank by batch recency, paginate.

use std::cmp::Reverse;

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use crate::CompanyRecord;
use crate::filters::{batch_matches, contains_ci};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Recency score of a batch label such as "Summer 2024".
///
/// `year * 10 + 2` for a Summer batch, `+ 1` for any other season, and 0 when
/// the label is missing, "Unspecified", or has no parseable year. A year too
/// large to score also gives 0.
pub fn batch_score(batch: &str) -> i64 {
    if batch.is_empty() || batch == "Unspecified" {
        return 0;
    }
    let mut parts = batch.split(' ');
    let (Some(season), Some(year)) = (parts.next(), parts.next()) else {
        return 0;
    };
    let Some(year) = leading_int(year) else {
        return 0;
    };
    let season_bonus = if season == "Summer" { 2 } else { 1 };
    year
        .checked_mul(10)
        .and_then(|score| score.checked_add(season_bonus))
        .unwrap_or(0)
}

/// Directory request parameters, as sent on the query string.
///
/// Numeric parameters are parsed leniently: a malformed value falls back to
/// its default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub year: Option<String>,
    pub industry: Option<String>,
    pub region: Option<String>,
    pub stage: Option<String>,
    pub team_size_min: Option<String>,
    pub team_size_max: Option<String>,
    /// Comma-separated list of accepted statuses.
    pub status: Option<String>,
    pub top_company: Option<String>,
    pub nonprofit: Option<String>,
    /// Comma-separated list; a company matches if it carries any of them.
    pub tags: Option<String>,
    pub launched_after: Option<String>,
    pub launched_before: Option<String>,
    pub subindustry: Option<String>,
}

/// One page of directory results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryPage {
    pub companies: Vec<CompanyRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl DirectoryQuery {
    pub fn page(&self) -> usize {
        parse_usize(&self.page).filter(|&p| p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        parse_usize(&self.limit)
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Whether `company` passes every present filter.
    pub fn matches(&self, company: &CompanyRecord) -> bool {
        if let Some(year) = non_empty(&self.year) {
            if !batch_matches(&company.batch, year) {
                return false;
            }
        }
        if let Some(industry) = non_empty(&self.industry) {
            let hit = contains_ci(&company.industry, industry)
                || company.industries.iter().any(|i| contains_ci(i, industry));
            if !hit {
                return false;
            }
        }
        if let Some(region) = non_empty(&self.region) {
            let hit = company.regions.iter().any(|r| contains_ci(r, region))
                || contains_ci(&company.all_locations, region);
            if !hit {
                return false;
            }
        }
        if let Some(stage) = non_empty(&self.stage) {
            if !contains_ci(&company.stage, stage) {
                return false;
            }
        }
        if !self.matches_team_size(company) {
            return false;
        }
        let statuses = split_list(&self.status);
        if !statuses.is_empty() && !statuses.contains(&company.status.as_str()) {
            return false;
        }
        if is_true(&self.top_company) && !company.top_company {
            return false;
        }
        if is_true(&self.nonprofit) && !company.nonprofit {
            return false;
        }
        let tags = split_list(&self.tags);
        if !tags.is_empty() && !tags.iter().any(|t| company.tags.iter().any(|ct| ct == t)) {
            return false;
        }
        if !self.matches_launch_year(company) {
            return false;
        }
        if let Some(sub) = non_empty(&self.subindustry) {
            if !contains_ci(&company.subindustry, sub) {
                return false;
            }
        }
        if let Some(q) = non_empty(&self.q) {
            if !search_matches(company, q) {
                return false;
            }
        }
        true
    }

    /// Filter, sort newest batch first, and cut out the requested page.
    pub fn run(&self, companies: &[CompanyRecord]) -> DirectoryPage {
        let mut matched: Vec<&CompanyRecord> =
            companies.iter().filter(|c| self.matches(c)).collect();
        matched.sort_by_key(|c| Reverse(batch_score(&c.batch)));

        let page = self.page();
        let limit = self.limit();
        let total = matched.len();
        let start = (page - 1).saturating_mul(limit);
        let companies = matched
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();

        DirectoryPage {
            companies,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    fn matches_team_size(&self, company: &CompanyRecord) -> bool {
        let min = non_empty(&self.team_size_min);
        let max = non_empty(&self.team_size_max);
        if min.is_none() && max.is_none() {
            return true;
        }
        let size = i64::from(company.team_size.unwrap_or(0));
        let min = min.and_then(leading_int).unwrap_or(0);
        let max = max.and_then(leading_int).unwrap_or(i64::MAX);
        size >= min && size <= max
    }

    fn matches_launch_year(&self, company: &CompanyRecord) -> bool {
        let after = non_empty(&self.launched_after);
        let before = non_empty(&self.launched_before);
        if after.is_none() && before.is_none() {
            return true;
        }
        let Some(year) = company
            .launched_at
            .filter(|&ts| ts != 0)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| i64::from(dt.year()))
        else {
            return false;
        };
        let after = after.and_then(leading_int).unwrap_or(0);
        let before = before.and_then(leading_int).unwrap_or(i64::MAX);
        year >= after && year <= before
    }
}

/// Free-text search over the descriptive fields. A four-digit query also
/// matches the batch's two-digit year.
fn search_matches(company: &CompanyRecord, query: &str) -> bool {
    let q = query.to_lowercase();
    let batch = company.batch.to_lowercase();

    let year_match = q.len() == 4
        && q.bytes().all(|b| b.is_ascii_digit())
        && batch.contains(&q[2..]);

    year_match
        || contains_ci(&company.name, &q)
        || contains_ci(&company.industry, &q)
        || contains_ci(&company.industries.join(" "), &q)
        || contains_ci(&company.regions.join(" "), &q)
        || contains_ci(&company.stage, &q)
        || contains_ci(&company.one_liner, &q)
        || batch.contains(&q)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn is_true(value: &Option<String>) -> bool {
    non_empty(value) == Some("true")
}

fn split_list(value: &Option<String>) -> Vec<&str> {
    non_empty(value)
        .map(|s| s.split(',').filter(|p| !p.is_empty()).collect())
        .unwrap_or_default()
}

fn parse_usize(value: &Option<String>) -> Option<usize> {
    non_empty(value)
        .and_then(leading_int)
        .and_then(|n| usize::try_from(n).ok())
}

/// Parse the leading (optionally signed) digits of `s`, ignoring the rest.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
