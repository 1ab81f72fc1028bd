//! Job-board HTML parsing.
//!
//! The target site renders every company's job board from one template: each
//! open role is a flex row holding a title link and a wrap of detail chips.
//! Detail chips carry no semantic markup, so they are classified by content
//! (see [`ycjobs_core::classify`]).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use ycjobs_core::{JobRecord, classify_details};

use crate::CardParseError;

/// Text shown instead of job cards when a company has no openings.
pub const NO_JOBS_MARKER: &str = "no jobs at";

static CARD: LazyLock<Selector> =
    LazyLock::new(|| css("div.flex.w-full.flex-row.items-start.justify-between.py-4"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| css(".ycdc-with-link-color a"));
static DETAILS: LazyLock<Selector> =
    LazyLock::new(|| css("div.justify-left.flex.flex-row.flex-wrap"));
static DETAIL: LazyLock<Selector> = LazyLock::new(|| css("div.capitalize"));

fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

/// What a company's job board showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobBoard {
    /// The page explicitly says there are no openings.
    NoOpenings,
    /// Parsed job cards, plus the cards that had to be skipped.
    Listings {
        jobs: Vec<JobRecord>,
        skipped: Vec<CardParseError>,
    },
}

impl JobBoard {
    pub fn jobs(&self) -> &[JobRecord] {
        match self {
            Self::NoOpenings => &[],
            Self::Listings { jobs, .. } => jobs,
        }
    }

    pub fn into_jobs(self) -> Vec<JobRecord> {
        match self {
            Self::NoOpenings => Vec::new(),
            Self::Listings { jobs, .. } => jobs,
        }
    }

    pub fn skipped(&self) -> &[CardParseError] {
        match self {
            Self::NoOpenings => &[],
            Self::Listings { skipped, .. } => skipped,
        }
    }
}

/// Whether `html` already shows job cards or the no-jobs notice.
pub fn board_rendered(html: &str) -> bool {
    let document = Html::parse_document(html);
    document.select(&CARD).next().is_some() || visible_text(&document).contains(NO_JOBS_MARKER)
}

/// Parse a rendered job board. Relative job links are resolved against
/// `origin`.
pub fn parse_job_board(html: &str, origin: &str) -> JobBoard {
    let document = Html::parse_document(html);
    if visible_text(&document).contains(NO_JOBS_MARKER) {
        return JobBoard::NoOpenings;
    }

    let mut jobs = Vec::new();
    let mut skipped = Vec::new();
    for (index, card) in document.select(&CARD).enumerate() {
        match parse_card(card, index, origin) {
            Ok(job) => jobs.push(job),
            Err(e) => skipped.push(e),
        }
    }
    JobBoard::Listings { jobs, skipped }
}

fn parse_card(card: ElementRef<'_>, index: usize, origin: &str) -> Result<JobRecord, CardParseError> {
    let title_link = card
        .select(&TITLE_LINK)
        .next()
        .ok_or(CardParseError::MissingTitle { index })?;
    let title = title_link.text().collect::<String>().trim().to_string();
    let url = title_link
        .value()
        .attr("href")
        .map(|href| absolute_url(href, origin))
        .unwrap_or_default();

    let fragments: Vec<String> = card
        .select(&DETAILS)
        .next()
        .map(|details| {
            details
                .select(&DETAIL)
                .map(|d| d.text().collect::<String>())
                .collect()
        })
        .unwrap_or_default();
    let details = classify_details(&fragments);

    Ok(JobRecord {
        title,
        location: details.location,
        salary: details.salary,
        equity: details.equity,
        url,
    })
}

/// Resolve `href` against `origin` unless it is already absolute.
fn absolute_url(href: &str, origin: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let origin = origin.trim_end_matches('/');
    match href.strip_prefix('/') {
        Some(path) => format!("{origin}/{path}"),
        None => format!("{origin}/{href}"),
    }
}

/// Lower-cased, whitespace-collapsed text of everything a reader would see.
fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.tree.nodes() {
        let Node::Text(t) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            text.push_str(t);
            text.push(' ');
        }
    }
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
