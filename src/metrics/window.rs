use chrono::{DateTime, Duration, Months, Utc};

/// Named look-back period, resolved against "now" at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
}

impl TimeWindow {
    /// The fixed window set, in report order.
    pub const ALL: [TimeWindow; 5] = [
        TimeWindow::Week,
        TimeWindow::Month,
        TimeWindow::ThreeMonths,
        TimeWindow::SixMonths,
        TimeWindow::Year,
    ];

    pub fn description(self) -> &'static str {
        match self {
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::ThreeMonths => "three months",
            TimeWindow::SixMonths => "six months",
            TimeWindow::Year => "year",
        }
    }

    /// Start of the window ending at `now`. Month arithmetic clamps to the
    /// last valid day (March 31 minus one month is February 28/29).
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            TimeWindow::Week => return now - Duration::days(7),
            TimeWindow::Month => 1,
            TimeWindow::ThreeMonths => 3,
            TimeWindow::SixMonths => 6,
            TimeWindow::Year => 12,
        };
        now.checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn at(self, now: DateTime<Utc>) -> Window {
        Window {
            name: self.description().to_string(),
            start: self.start(now),
            end: now,
        }
    }
}

/// Concrete `[start, end]` bounds handed to windowed metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_starts() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(TimeWindow::Week.start(now), Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap());
        assert_eq!(TimeWindow::Month.start(now), Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(TimeWindow::ThreeMonths.start(now), Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap());
        assert_eq!(TimeWindow::SixMonths.start(now), Utc.with_ymd_and_hms(2023, 9, 30, 12, 0, 0).unwrap());
        assert_eq!(TimeWindow::Year.start(now), Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let week = TimeWindow::Week.at(now);
        assert_eq!(week.name, "week");
        assert!(week.contains(now));
        assert!(week.contains(week.start));
        assert!(!week.contains(week.start - Duration::seconds(1)));
        assert!(!week.contains(now + Duration::seconds(1)));
    }

    #[test]
    fn test_all_is_ordered_shortest_first() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let starts: Vec<_> = TimeWindow::ALL.iter().map(|w| w.start(now)).collect();
        assert!(starts.windows(2).all(|pair| pair[0] > pair[1]));
    }
}
