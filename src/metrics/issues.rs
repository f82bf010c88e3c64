use super::{CollectionMetric, Line, Window, WindowedMetric};
use crate::github::Issue;

pub struct TotalCount;

impl CollectionMetric for TotalCount {
    fn evaluate(&self, issues: &[Issue]) -> Line {
        Line::new("Total amount of issues", issues.len())
    }
}

pub struct OpenCount;

impl CollectionMetric for OpenCount {
    fn evaluate(&self, issues: &[Issue]) -> Line {
        let open = issues.iter().filter(|i| i.is_open()).count();
        Line::new("Total amount of open issues", open)
    }
}

fn opened_in(issues: &[Issue], window: &Window) -> usize {
    issues.iter().filter(|i| window.contains(i.created_at)).count()
}

fn closed_in(issues: &[Issue], window: &Window) -> usize {
    issues
        .iter()
        .filter(|i| i.closed_at.is_some_and(|at| window.contains(at)))
        .count()
}

pub struct OpenedInWindow;

impl WindowedMetric for OpenedInWindow {
    fn evaluate(&self, issues: &[Issue], window: &Window) -> Line {
        Line::new(
            format!("Issues opened in the previous {}", window.name),
            opened_in(issues, window),
        )
    }
}

pub struct ClosedInWindow;

impl WindowedMetric for ClosedInWindow {
    fn evaluate(&self, issues: &[Issue], window: &Window) -> Line {
        Line::new(
            format!("Issues closed in the previous {}", window.name),
            closed_in(issues, window),
        )
    }
}

/// Opened minus closed, both counted against the same window bounds.
pub struct NetDelta;

impl WindowedMetric for NetDelta {
    fn evaluate(&self, issues: &[Issue], window: &Window) -> Line {
        let delta = opened_in(issues, window) as i64 - closed_in(issues, window) as i64;
        Line::new(
            format!("+ - open/closed in the previous {}", window.name),
            delta,
        )
    }
}
