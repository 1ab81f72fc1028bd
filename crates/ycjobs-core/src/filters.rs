//! Company filter predicates shared by the scrape fallback path and the
//! directory API.
//!
//! All matching is case-insensitive substring matching. The year filter is
//! special: upstream batch labels mix full names ("Summer 2024"), short codes
//! ("W24", "S24") and bare two-digit forms ("24"), so a four-digit year is
//! expanded into each of those shapes before matching.

use serde::{Deserialize, Serialize};

use crate::CompanyRecord;

/// Optional filters narrowing the set of companies to scrape.
///
/// Empty or whitespace-only values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFilters {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    /// Company-name search.
    #[serde(default)]
    pub query: Option<String>,
}

impl CompanyFilters {
    /// Copy with blank values dropped and the rest trimmed.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            year: clean(&self.year),
            industry: clean(&self.industry),
            region: clean(&self.region),
            stage: clean(&self.stage),
            query: clean(&self.query),
        }
    }

    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.year.is_none()
            && n.industry.is_none()
            && n.region.is_none()
            && n.stage.is_none()
            && n.query.is_none()
    }

    /// The non-empty name query, if any.
    pub fn name_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Query-string pairs for the primary company source, `limit` first.
    pub fn query_pairs(&self, limit: usize) -> Vec<(&'static str, String)> {
        let n = self.normalized();
        let mut pairs = vec![("limit", limit.to_string())];
        if let Some(q) = n.query {
            pairs.push(("q", q));
        }
        if let Some(year) = n.year {
            pairs.push(("year", year));
        }
        if let Some(industry) = n.industry {
            pairs.push(("industry", industry));
        }
        if let Some(region) = n.region {
            pairs.push(("region", region));
        }
        if let Some(stage) = n.stage {
            pairs.push(("stage", stage));
        }
        pairs
    }

    /// Human-readable rendering for progress lines, e.g. `year=2024 industry=AI`.
    pub fn describe(&self) -> String {
        self.query_pairs(0)
            .into_iter()
            .skip(1)
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `company` passes every present filter.
    pub fn matches(&self, company: &CompanyRecord) -> bool {
        let n = self.normalized();
        if let Some(year) = &n.year {
            if !batch_matches(&company.batch, year) {
                return false;
            }
        }
        if let Some(industry) = &n.industry {
            if !company.industries.iter().any(|i| contains_ci(i, industry)) {
                return false;
            }
        }
        if let Some(region) = &n.region {
            if !contains_ci(&company.all_locations, region) {
                return false;
            }
        }
        if let Some(stage) = &n.stage {
            if !contains_ci(&company.stage, stage) {
                return false;
            }
        }
        if let Some(query) = &n.query {
            if !contains_ci(&company.name, query) {
                return false;
            }
        }
        true
    }

    /// Filter `companies` locally and keep at most `limit`, preserving order.
    pub fn apply(&self, companies: Vec<CompanyRecord>, limit: usize) -> Vec<CompanyRecord> {
        companies
            .into_iter()
            .filter(|c| self.matches(c))
            .take(limit)
            .collect()
    }
}

/// Match a batch label against a year filter.
///
/// A four-digit `year` matches the full year, the `w`/`s` short codes, a
/// trailing two-digit year, or a bare two-digit batch. Anything else is a
/// plain substring match.
pub fn batch_matches(batch: &str, year: &str) -> bool {
    let batch = batch.to_lowercase();
    let year = year.trim().to_lowercase();

    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        let short = &year[2..];
        return batch.contains(&year)
            || batch.contains(&format!("w{short}"))
            || batch.contains(&format!("s{short}"))
            || batch.ends_with(&format!(" {short}"))
            || batch == short;
    }
    batch.contains(&year)
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str, batch: &str) -> CompanyRecord {
        CompanyRecord {
            name: name.into(),
            batch: batch.into(),
            ..Default::default()
        }
    }

    #[test]
    fn year_matches_batch_shapes() {
        assert!(batch_matches("Summer 2020", "2020"));
        assert!(batch_matches("W20", "2020"));
        assert!(batch_matches("S20", "2020"));
        assert!(batch_matches("Winter 20", "2020"));
        assert!(batch_matches("20", "2020"));
        assert!(!batch_matches("Summer 2021", "2020"));
        assert!(!batch_matches("21", "2020"));
        assert!(!batch_matches("IK12", "2020"));
    }

    #[test]
    fn non_four_digit_year_is_substring() {
        assert!(batch_matches("Summer 24", "24"));
        assert!(batch_matches("Summer 2024", "summer"));
        assert!(!batch_matches("Winter 2024", "summer"));
    }

    #[test]
    fn blank_filters_are_absent() {
        let filters = CompanyFilters {
            year: Some("   ".into()),
            query: Some(String::new()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert!(filters.name_query().is_none());
        assert!(filters.matches(&company("Anything", "W99")));
    }

    #[test]
    fn industry_matches_any_entry() {
        let mut c = company("Acme", "S24");
        c.industries = vec!["B2B".into(), "Artificial Intelligence".into()];
        let filters = CompanyFilters {
            industry: Some("intelligence".into()),
            ..Default::default()
        };
        assert!(filters.matches(&c));
        c.industries.clear();
        assert!(!filters.matches(&c));
    }

    #[test]
    fn region_and_stage_are_substrings() {
        let mut c = company("Acme", "S24");
        c.all_locations = "San Francisco, CA, USA".into();
        c.stage = "Early".into();
        let filters = CompanyFilters {
            region: Some("francisco".into()),
            stage: Some("EARLY".into()),
            ..Default::default()
        };
        assert!(filters.matches(&c));
    }

    #[test]
    fn apply_truncates_in_order() {
        let companies: Vec<_> = (0..10)
            .map(|i| company(&format!("Co {i}"), "Summer 2024"))
            .collect();
        let filters = CompanyFilters {
            year: Some("2024".into()),
            ..Default::default()
        };
        let kept = filters.apply(companies, 4);
        let names: Vec<_> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Co 0", "Co 1", "Co 2", "Co 3"]);
    }

    #[test]
    fn query_pairs_skip_absent() {
        let filters = CompanyFilters {
            year: Some("2024".into()),
            stage: Some(" Growth ".into()),
            ..Default::default()
        };
        assert_eq!(
            filters.query_pairs(50),
            vec![
                ("limit", "50".to_string()),
                ("year", "2024".to_string()),
                ("stage", "Growth".to_string()),
            ]
        );
        assert_eq!(filters.describe(), "year=2024 stage=Growth");
    }
}
