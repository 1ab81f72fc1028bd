//! Scraper configuration and defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api/hiring";
pub const HIRING_SNAPSHOT_URL: &str = "https://yc-oss.github.io/api/companies/hiring.json";
pub const ALL_COMPANIES_SNAPSHOT_URL: &str = "https://yc-oss.github.io/api/companies/all.json";
pub const SITE_ORIGIN: &str = "https://www.ycombinator.com";
pub const DEFAULT_RESULTS_DIR: &str = "./bot/results";
pub const DEFAULT_LIMIT: usize = 100;
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a scrape run needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Primary, filter-aware company source.
    pub api_url: String,
    /// Unfiltered static snapshot used when the primary source fails.
    pub snapshot_url: String,
    /// Origin that relative job links are resolved against.
    pub site_origin: String,
    pub results_dir: PathBuf,
    pub default_limit: usize,
    pub headless: bool,
    pub navigation_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            snapshot_url: HIRING_SNAPSHOT_URL.to_string(),
            site_origin: SITE_ORIGIN.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            default_limit: DEFAULT_LIMIT,
            headless: true,
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }
}

impl ScraperConfig {
    /// The output collection, overwritten after every company.
    pub fn jobs_file(&self) -> PathBuf {
        self.results_dir.join("jobs.json")
    }

    /// Directory holding one timestamped snapshot per run.
    pub fn backup_dir(&self) -> PathBuf {
        self.results_dir.join("backup")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let config = ScraperConfig {
            results_dir: PathBuf::from("/tmp/out"),
            ..Default::default()
        };
        assert_eq!(config.jobs_file(), PathBuf::from("/tmp/out/jobs.json"));
        assert_eq!(config.backup_dir(), PathBuf::from("/tmp/out/backup"));
    }

    #[test]
    fn defaults() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.default_limit, 100);
    }
}
