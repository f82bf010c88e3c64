pub mod types;

pub use types::{OutputFormat, Report};

use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::github::{Comment, Issue, Repository};
use crate::index::IssueCommentIndex;
use crate::metrics::issues::{ClosedInWindow, NetDelta, OpenCount, OpenedInWindow, TotalCount};
use crate::metrics::maintainer::{ResponseTime, TwoWeekdayResponses, UnansweredByMaintainer};
use crate::metrics::{self, CollectionMetric, IndexMetric, Line, MaintainerSet};

pub const CSV_HEADER: &str = "Number, State, URL, Title, User, Labels, Created At";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Evaluate every metric in report order.
///
/// Counts come first, then opened/closed/delta grouped per window. Maintainer
/// metrics are only evaluated when a maintainer set is configured.
pub fn compose(
    issues: &[Issue],
    comments: &[Comment],
    maintainers: Option<&MaintainerSet>,
    now: DateTime<Utc>,
) -> Vec<Line> {
    let mut lines = vec![TotalCount.evaluate(issues), OpenCount.evaluate(issues)];

    let opened = metrics::windowed(&OpenedInWindow, issues, now);
    let closed = metrics::windowed(&ClosedInWindow, issues, now);
    let delta = metrics::windowed(&NetDelta, issues, now);
    for ((opened, closed), delta) in opened.into_iter().zip(closed).zip(delta) {
        lines.extend([opened, closed, delta]);
    }

    if let Some(maintainers) = maintainers {
        let index = IssueCommentIndex::build(issues, comments);
        debug!(issues = index.len(), linked = index.linked_comments(), "evaluating maintainer metrics");
        lines.extend(metrics::windowed_index(&TwoWeekdayResponses, &index, maintainers, now));
        lines.extend(UnansweredByMaintainer.evaluate(&index, maintainers));
        lines.extend(metrics::windowed_index(&ResponseTime, &index, maintainers, now));
    } else {
        debug!("no maintainers configured, skipping maintainer metrics");
    }

    lines
}

pub fn build(repository: &Repository, lines: Vec<Line>, now: DateTime<Utc>) -> Report {
    Report {
        repository: repository.to_string(),
        generated_at: now,
        lines,
    }
}

/// Write the report lines to stdout in the requested format.
#[instrument(skip(report), fields(repository = %report.repository, lines = report.lines.len()))]
pub fn output(report: &Report, format: OutputFormat) -> Result<(), ReportError> {
    match format {
        OutputFormat::Text => {
            print_terminal_report(report);
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", render_json(report)?);
            Ok(())
        }
    }
}

/// The report lines as a JSON array of `{label, value}` objects.
pub fn render_json(report: &Report) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&report.lines)?)
}

fn print_terminal_report(report: &Report) {
    println!();
    println!(
        "═══ {} ═══ ({})",
        report.repository.bold(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    for line in &report.lines {
        println!(">  {}: {}", line.label, line.value.cyan());
    }
    println!();
}

/// Replace commas so a field can never split a CSV row.
fn escape(field: &str) -> String {
    field.replace(',', " ")
}

/// CSV export of `issues`, header first, one row per issue.
pub fn csv(issues: &[Issue]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for issue in issues {
        let labels = issue
            .labels
            .iter()
            .map(|l| escape(&l.name))
            .collect::<Vec<_>>()
            .join(" | ");
        let row = [
            issue.number.to_string(),
            escape(&issue.state.to_string()),
            escape(&issue.html_url),
            escape(&issue.title),
            escape(issue.author()),
            labels,
            escape(&issue.created_at.to_rfc3339()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[instrument(skip(issues, path), fields(issues = issues.len(), path = %path.display()))]
pub fn write_csv(issues: &[Issue], path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, csv(issues))?;
    debug!("wrote csv report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::github::types::fixtures::{comment, issue};
    use crate::github::IssueState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 18, 0, 0).unwrap()
    }

    fn sample() -> (Vec<Issue>, Vec<Comment>) {
        let monday = Utc.with_ymd_and_hms(2024, 5, 27, 9, 0, 0).unwrap();
        let answered = issue(1, "user", IssueState::Open, monday);
        let ignored = issue(2, "user", IssueState::Open, monday - Duration::days(10));
        let mut done = issue(3, "user", IssueState::Closed, monday - Duration::days(40));
        done.closed_at = Some(monday);
        let comments = vec![comment(10, "maya", &answered, monday + Duration::days(1))];
        (vec![answered, ignored, done], comments)
    }

    fn maintainers() -> MaintainerSet {
        ["maya".to_string()].into_iter().collect()
    }

    #[test]
    fn test_compose_without_maintainers() {
        let (issues, comments) = sample();
        let lines = compose(&issues, &comments, None, now());
        assert_eq!(lines.len(), 2 + 3 * 5);
        assert_eq!(lines[0].to_string(), "Total amount of issues: 3");
        assert_eq!(lines[1].to_string(), "Total amount of open issues: 2");
        assert_eq!(lines[2].to_string(), "Issues opened in the previous week: 1");
        assert_eq!(lines[3].to_string(), "Issues closed in the previous week: 1");
        assert_eq!(lines[4].to_string(), "+ - open/closed in the previous week: 0");
        assert!(lines[5].label.ends_with("previous month"));
    }

    #[test]
    fn test_compose_with_maintainers() {
        let (issues, comments) = sample();
        let lines = compose(&issues, &comments, Some(&maintainers()), now());
        // counts, 5 two-weekday lines, one unanswered issue, 5 response-time lines
        assert_eq!(lines.len(), 17 + 5 + 1 + 5);
        assert_eq!(lines[17].value, "1");
        assert_eq!(lines[22].value, "2 / https://github.com/org/repo/issues/2");
        assert_eq!(lines[23].value, "Average: 1 | Median: 1");
    }

    #[test]
    fn test_compose_from_cache_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let (issues, comments) = sample();
        cache.store("issues", &issues).unwrap();
        cache.store("comments", &comments).unwrap();

        let run = || {
            let issues: Vec<Issue> = cache.load("issues").unwrap();
            let comments: Vec<Comment> = cache.load("comments").unwrap();
            compose(&issues, &comments, Some(&maintainers()), now())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_csv_replaces_commas() {
        let mut flagged = issue(7, "user", IssueState::Open, now());
        flagged.title = "Crash, then hang".to_string();
        flagged.labels = vec![
            crate::github::types::Label {
                id: 1,
                name: "bug".to_string(),
                color: String::new(),
                description: None,
                default: false,
            },
            crate::github::types::Label {
                id: 2,
                name: "needs,triage".to_string(),
                color: String::new(),
                description: None,
                default: false,
            },
        ];
        let out = csv(&[flagged]);
        let mut rows = out.lines();
        assert_eq!(rows.next(), Some(CSV_HEADER));
        let row = rows.next().unwrap();
        assert_eq!(row.split(',').count(), 7);
        assert_eq!(
            row,
            "7,open,https://github.com/org/repo/issues/7,Crash  then hang,user,bug | needs triage,2024-05-31T18:00:00+00:00"
        );
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issue_report.csv");
        let (issues, _) = sample();
        write_csv(&issues, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with(CSV_HEADER));
    }

    #[test]
    fn test_output_formats_do_not_fail() {
        let (issues, comments) = sample();
        let repository = Repository::parse("org/repo").unwrap();
        let report = build(&repository, compose(&issues, &comments, None, now()), now());
        output(&report, OutputFormat::Text).unwrap();
        output(&report, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_json_output_is_array_of_lines() {
        let (issues, comments) = sample();
        let repository = Repository::parse("org/repo").unwrap();
        let report = build(&repository, compose(&issues, &comments, None, now()), now());

        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        let lines = json.as_array().unwrap();
        assert_eq!(lines.len(), report.lines.len());
        for line in lines {
            let fields = line.as_object().unwrap();
            assert_eq!(fields.len(), 2);
            assert!(fields["label"].is_string());
            assert!(fields["value"].is_string());
        }
        assert_eq!(lines[0]["label"], "Total amount of issues");
        assert_eq!(lines[0]["value"], "3");
    }
}
