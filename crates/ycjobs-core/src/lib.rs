//! Core types, filter predicates, and shared configuration for ycjobs.

pub mod classify;
pub mod company;
pub mod config;
pub mod directory;
pub mod filters;
pub mod job;
pub mod limit;

pub use classify::{CardDetails, DetailKind, classify_details, classify_fragment};
pub use company::CompanyRecord;
pub use config::ScraperConfig;
pub use directory::{DirectoryPage, DirectoryQuery, batch_score};
pub use filters::{CompanyFilters, batch_matches};
pub use job::{CompanyScrapeResult, JobRecord};
pub use limit::{ALL_COMPANIES_BOUND, Limit, LimitParseError};
