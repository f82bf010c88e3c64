use chrono::{DateTime, Utc};

use crate::metrics::Line;

/// How report lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `>  label: value` lines
    #[default]
    Text,
    /// JSON array of `{label, value}` objects
    Json,
}

/// Complete report for one repository.
#[derive(Debug)]
pub struct Report {
    /// `org/repo`
    pub repository: String,
    /// Instant every window was resolved against
    pub generated_at: DateTime<Utc>,
    /// Metric lines in report order
    pub lines: Vec<Line>,
}
