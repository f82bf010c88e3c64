pub mod calendar;
pub mod issues;
pub mod maintainer;
pub mod window;

pub use window::{TimeWindow, Window};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::github::Issue;
use crate::index::IssueCommentIndex;

/// One `label: value` row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub label: String,
    pub value: String,
}

impl Line {
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Usernames whose comments count as a maintainer response.
pub type MaintainerSet = HashSet<String>;

/// Metric over the whole issue collection.
pub trait CollectionMetric {
    fn evaluate(&self, issues: &[Issue]) -> Line;
}

/// Metric over the issue collection bounded by a window.
pub trait WindowedMetric {
    fn evaluate(&self, issues: &[Issue], window: &Window) -> Line;
}

/// Metric over the issue/comment index that may emit any number of lines.
pub trait IndexMetric {
    fn evaluate(&self, index: &IssueCommentIndex, maintainers: &MaintainerSet) -> Vec<Line>;
}

/// Metric over the issue/comment index bounded by a window.
pub trait WindowedIndexMetric {
    fn evaluate(
        &self,
        index: &IssueCommentIndex,
        maintainers: &MaintainerSet,
        window: &Window,
    ) -> Line;
}

/// Evaluate `metric` once per window of [`TimeWindow::ALL`], in order.
pub fn windowed<M: WindowedMetric>(metric: &M, issues: &[Issue], now: DateTime<Utc>) -> Vec<Line> {
    TimeWindow::ALL
        .iter()
        .map(|w| metric.evaluate(issues, &w.at(now)))
        .collect()
}

pub fn windowed_index<M: WindowedIndexMetric>(
    metric: &M,
    index: &IssueCommentIndex,
    maintainers: &MaintainerSet,
    now: DateTime<Utc>,
) -> Vec<Line> {
    TimeWindow::ALL
        .iter()
        .map(|w| metric.evaluate(index, maintainers, &w.at(now)))
        .collect()
}
