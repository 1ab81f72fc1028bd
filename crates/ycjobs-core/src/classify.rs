//! Ordered-rule classifier for job-card detail fragments.
//!
//! A job card lists its details (location, salary range, equity range) as
//! loose text fragments whose order is not guaranteed. Each fragment is
//! sniffed by content, first rule wins:
//!
//! 1. contains `$`, `£`, `€` or an uppercase `K` magnitude marker → salary
//! 2. contains `%` → equity
//! 3. non-empty and no location yet → location
//!
//! Anything else is discarded.

const CURRENCY_MARKERS: &[char] = &['$', '£', '€', 'K'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Salary,
    Equity,
    Location,
}

/// Classify one trimmed fragment. `location_filled` reports whether an
/// earlier fragment already claimed the location slot.
pub fn classify_fragment(fragment: &str, location_filled: bool) -> Option<DetailKind> {
    if fragment.contains(CURRENCY_MARKERS) {
        Some(DetailKind::Salary)
    } else if fragment.contains('%') {
        Some(DetailKind::Equity)
    } else if !location_filled && !fragment.is_empty() {
        Some(DetailKind::Location)
    } else {
        None
    }
}

/// Location, salary and equity extracted from a card's detail fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub location: String,
    pub salary: String,
    pub equity: String,
}

/// Run every fragment through [`classify_fragment`]. Later salary or equity
/// fragments replace earlier ones; only the first location is kept.
pub fn classify_details<I, S>(fragments: I) -> CardDetails
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut details = CardDetails::default();
    for fragment in fragments {
        let trimmed = fragment.as_ref().trim();
        match classify_fragment(trimmed, !details.location.is_empty()) {
            Some(DetailKind::Salary) => details.salary = trimmed.to_string(),
            Some(DetailKind::Equity) => details.equity = trimmed.to_string(),
            Some(DetailKind::Location) => details.location = trimmed.to_string(),
            None => {}
        }
    }
    details
}
