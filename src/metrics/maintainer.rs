use super::calendar::{add_weekdays, weekdays_between};
use super::{IndexMetric, Line, MaintainerSet, Window, WindowedIndexMetric};
use crate::github::{Comment, Issue};
use crate::index::IssueCommentIndex;

fn is_maintainer(maintainers: &MaintainerSet, login: &str) -> bool {
    maintainers.contains(login)
}

/// Open issues from non-maintainers that no maintainer has commented on,
/// oldest first, one line each.
pub struct UnansweredByMaintainer;

impl IndexMetric for UnansweredByMaintainer {
    fn evaluate(&self, index: &IssueCommentIndex, maintainers: &MaintainerSet) -> Vec<Line> {
        let mut unanswered: Vec<&Issue> = index
            .iter()
            .filter(|(issue, _)| issue.is_open() && !is_maintainer(maintainers, issue.author()))
            .filter(|(_, comments)| {
                comments
                    .iter()
                    .all(|c| !is_maintainer(maintainers, c.author()))
            })
            .map(|(issue, _)| issue)
            .collect();
        unanswered.sort_by_key(|issue| (issue.created_at, issue.number));

        unanswered
            .into_iter()
            .map(|issue| Line::new("Number / URL", format!("{} / {}", issue.number, issue.html_url)))
            .collect()
    }
}

/// For issues opened in the window, the number of maintainer comments made
/// no later than two weekdays after the issue was opened.
pub struct TwoWeekdayResponses;

impl WindowedIndexMetric for TwoWeekdayResponses {
    fn evaluate(
        &self,
        index: &IssueCommentIndex,
        maintainers: &MaintainerSet,
        window: &Window,
    ) -> Line {
        let count: usize = index
            .iter()
            .filter(|(issue, _)| window.contains(issue.created_at))
            .map(|(issue, comments)| {
                let deadline = add_weekdays(issue.created_at, 2);
                comments
                    .iter()
                    .filter(|c| is_maintainer(maintainers, c.author()) && c.created_at <= deadline)
                    .count()
            })
            .sum();

        Line::new(
            format!(
                "# issues opened w/o maintainer response w/in 2 weekdays in previous {}",
                window.name
            ),
            count,
        )
    }
}

/// Weekdays from opening to the first maintainer comment, averaged and
/// medianed over issues opened in the window that got one.
pub struct ResponseTime;

impl ResponseTime {
    fn first_response<'a>(comments: &'a [Comment], maintainers: &MaintainerSet) -> Option<&'a Comment> {
        comments
            .iter()
            .filter(|c| is_maintainer(maintainers, c.author()))
            .min_by_key(|c| (c.created_at, c.id))
    }

    /// Response times in weekdays, ascending.
    pub fn response_days(
        index: &IssueCommentIndex,
        maintainers: &MaintainerSet,
        window: &Window,
    ) -> Vec<u32> {
        let mut days: Vec<u32> = index
            .iter()
            .filter(|(issue, _)| window.contains(issue.created_at))
            .filter_map(|(issue, comments)| {
                Self::first_response(comments, maintainers)
                    .map(|first| weekdays_between(issue.created_at, first.created_at))
            })
            .collect();
        days.sort_unstable();
        days
    }
}

/// Truncating mean and lower-middle median of an ascending list, `None` when empty.
pub fn average_and_median(sorted: &[u32]) -> Option<(u32, u32)> {
    if sorted.is_empty() {
        return None;
    }
    let total: u64 = sorted.iter().map(|&d| u64::from(d)).sum();
    let average = (total / sorted.len() as u64) as u32;
    let median = sorted[(sorted.len() - 1) / 2];
    Some((average, median))
}

impl WindowedIndexMetric for ResponseTime {
    fn evaluate(
        &self,
        index: &IssueCommentIndex,
        maintainers: &MaintainerSet,
        window: &Window,
    ) -> Line {
        let days = Self::response_days(index, maintainers, window);
        let value = match average_and_median(&days) {
            Some((average, median)) => format!("Average: {} | Median: {}", average, median),
            None => "no data".to_string(),
        };
        Line::new(
            format!(
                "Maintainer response time in weekdays for issues opened {} - {}",
                window.start.format("%m/%d/%Y"),
                window.end.format("%m/%d/%Y")
            ),
            value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::fixtures::{comment, issue};
    use crate::github::IssueState;
    use crate::metrics::TimeWindow;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn maintainers() -> MaintainerSet {
        ["maya".to_string(), "max".to_string()].into_iter().collect()
    }

    // Friday 2024-05-31
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 18, 0, 0).unwrap()
    }

    // Monday 2024-05-27
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 27, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_unanswered_lists_open_non_maintainer_issues_oldest_first() {
        let newer = issue(2, "user", IssueState::Open, monday());
        let older = issue(1, "user", IssueState::Open, monday() - Duration::days(3));
        let answered = issue(3, "user", IssueState::Open, monday());
        let closed = issue(4, "user", IssueState::Closed, monday());
        let comments = vec![
            comment(10, "another-user", &newer, monday()),
            comment(11, "maya", &answered, monday()),
        ];
        let index = IssueCommentIndex::build(&[newer, older, answered, closed], &comments);

        let lines = UnansweredByMaintainer.evaluate(&index, &maintainers());
        let values: Vec<&str> = lines.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "1 / https://github.com/org/repo/issues/1",
                "2 / https://github.com/org/repo/issues/2"
            ]
        );
        assert_eq!(lines[0].label, "Number / URL");
    }

    #[test]
    fn test_unanswered_never_lists_maintainer_issues() {
        let own = issue(1, "max", IssueState::Open, monday());
        let comments = vec![comment(10, "user", &own, monday())];
        let index = IssueCommentIndex::build(&[own], &comments);
        assert!(UnansweredByMaintainer.evaluate(&index, &maintainers()).is_empty());
    }

    #[test]
    fn test_two_weekday_responses_counts_maintainer_comments_by_deadline() {
        let opened = issue(1, "user", IssueState::Open, monday());
        let comments = vec![
            comment(10, "maya", &opened, monday() + Duration::hours(3)),
            comment(11, "max", &opened, monday() + Duration::days(2)),
            comment(12, "max", &opened, monday() + Duration::days(2) + Duration::minutes(1)),
            comment(13, "user", &opened, monday() + Duration::hours(1)),
        ];
        let old = issue(2, "user", IssueState::Open, monday() - Duration::days(20));
        let old_comments = vec![comment(14, "maya", &old, old.created_at)];
        let all: Vec<_> = comments.into_iter().chain(old_comments).collect();
        let index = IssueCommentIndex::build(&[opened, old], &all);

        let week = TimeWindow::Week.at(now());
        let line = TwoWeekdayResponses.evaluate(&index, &maintainers(), &week);
        assert_eq!(line.value, "2");
        assert!(line.label.ends_with("previous week"));

        let month = TimeWindow::Month.at(now());
        assert_eq!(TwoWeekdayResponses.evaluate(&index, &maintainers(), &month).value, "3");
    }

    #[test]
    fn test_response_time_excludes_unanswered_issues() {
        let a = issue(1, "user", IssueState::Open, monday());
        let b = issue(2, "user", IssueState::Open, monday());
        let c = issue(3, "user", IssueState::Open, monday());
        let comments = vec![
            comment(10, "maya", &a, monday() + Duration::days(1)),
            comment(11, "max", &b, monday() + Duration::days(3)),
            comment(12, "maya", &b, monday() + Duration::days(4)),
            comment(13, "user", &c, monday() + Duration::days(1)),
        ];
        let index = IssueCommentIndex::build(&[a, b, c], &comments);
        let week = TimeWindow::Week.at(now());

        assert_eq!(ResponseTime::response_days(&index, &maintainers(), &week), vec![1, 3]);
        let line = ResponseTime.evaluate(&index, &maintainers(), &week);
        assert_eq!(line.value, "Average: 2 | Median: 1");
        assert_eq!(
            line.label,
            "Maintainer response time in weekdays for issues opened 05/24/2024 - 05/31/2024"
        );
    }

    #[test]
    fn test_response_time_without_data() {
        let lonely = issue(1, "user", IssueState::Open, monday());
        let index = IssueCommentIndex::build(&[lonely], &[]);
        let week = TimeWindow::Week.at(now());
        assert_eq!(ResponseTime.evaluate(&index, &maintainers(), &week).value, "no data");
    }

    #[test]
    fn test_average_and_median() {
        assert_eq!(average_and_median(&[]), None);
        assert_eq!(average_and_median(&[4]), Some((4, 4)));
        assert_eq!(average_and_median(&[1, 2, 4]), Some((2, 2)));
        assert_eq!(average_and_median(&[0, 1, 5, 9]), Some((3, 1)));
    }
}
