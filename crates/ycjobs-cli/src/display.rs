//! Plain-text rendering of scrape results for the terminal.

use std::fmt::Write;

use ycjobs_core::{CompanyScrapeResult, JobRecord};
use ycjobs_runner::RunSummary;

const MAX_JOBS_SHOWN: usize = 10;

/// One block per company: a header line with the job count or error, then
/// up to [`MAX_JOBS_SHOWN`] job lines.
pub fn render_results(results: &[CompanyScrapeResult]) -> String {
    if results.is_empty() {
        return "No results yet. Run `ycjobs scrape` first.\n".to_string();
    }

    let width = results.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let status = match &result.error {
            Some(e) => format!("error: {e}"),
            None => plural(result.jobs.len(), "job"),
        };
        let _ = writeln!(out, "{:>3}. {:<width$}  {status}", i + 1, result.name);
        for job in result.jobs.iter().take(MAX_JOBS_SHOWN) {
            let _ = writeln!(out, "       {}", job_line(job));
        }
        if result.jobs.len() > MAX_JOBS_SHOWN {
            let _ = writeln!(out, "       … {} more", result.jobs.len() - MAX_JOBS_SHOWN);
        }
    }

    let jobs: usize = results.iter().map(|r| r.jobs.len()).sum();
    let failed = results.iter().filter(|r| r.is_error()).count();
    let _ = writeln!(
        out,
        "\n{} ({failed} failed), {}",
        plural(results.len(), "company"),
        plural(jobs, "job")
    );
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    if summary.cancelled {
        out.push_str("Stopped early.\n");
    }
    let _ = writeln!(
        out,
        "{} scraped, {} found",
        plural(summary.companies_scraped, "company"),
        plural(summary.jobs_found, "job")
    );
    let _ = writeln!(out, "Output: {}", summary.output_file.display());
    if let Some(backup) = &summary.backup_file {
        let _ = writeln!(out, "Backup: {}", backup.display());
    }
    out
}

/// `title · location · salary · equity`, skipping empty fields.
fn job_line(job: &JobRecord) -> String {
    [&job.title, &job.location, &job.salary, &job.equity]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" · ")
}

fn plural(n: usize, noun: &str) -> String {
    match (n, noun) {
        (1, _) => format!("1 {noun}"),
        (_, "company") => format!("{n} companies"),
        _ => format!("{n} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use ycjobs_core::CompanyRecord;

    fn company(name: &str) -> CompanyRecord {
        CompanyRecord {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn renders_jobs_and_errors() {
        let results = vec![
            CompanyScrapeResult::succeeded(
                &company("Acme"),
                vec![JobRecord {
                    title: "Engineer".into(),
                    location: "Remote".into(),
                    equity: "0.5%".into(),
                    ..Default::default()
                }],
            ),
            CompanyScrapeResult::failed(&company("Globex"), "navigation timed out"),
        ];
        let text = render_results(&results);
        assert!(text.contains("  1. Acme    1 job\n"));
        assert!(text.contains("       Engineer · Remote · 0.5%\n"));
        assert!(text.contains("  2. Globex  error: navigation timed out\n"));
        assert!(text.ends_with("2 companies (1 failed), 1 job\n"));
    }

    #[test]
    fn long_job_lists_are_truncated() {
        let jobs = (0..12)
            .map(|i| JobRecord {
                title: format!("Role {i}"),
                ..Default::default()
            })
            .collect();
        let text = render_results(&[CompanyScrapeResult::succeeded(&company("Big"), jobs)]);
        assert!(text.contains("Role 9"));
        assert!(!text.contains("Role 10"));
        assert!(text.contains("… 2 more"));
    }

    #[test]
    fn empty_results() {
        assert!(render_results(&[]).starts_with("No results yet"));
    }

    #[test]
    fn summary_mentions_backup() {
        let summary = RunSummary {
            success: true,
            companies_scraped: 3,
            jobs_found: 1,
            cancelled: true,
            output_file: PathBuf::from("out/jobs.json"),
            backup_file: Some(PathBuf::from("out/backup/jobs-x.json")),
            results: vec![],
        };
        let text = render_summary(&summary);
        assert!(text.starts_with("Stopped early.\n"));
        assert!(text.contains("3 companies scraped, 1 job found"));
        assert!(text.contains("Backup: out/backup/jobs-x.json"));
    }
}
