//! Weekday offsets. Saturdays and Sundays are skipped; there is no holiday calendar.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `at` moved forward by `days` weekdays, keeping the time of day.
pub fn add_weekdays(at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = at;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if is_weekday(current.date_naive()) {
            remaining -= 1;
        }
    }
    current
}

/// Weekdays in the date range `(from, to]`, or 0 when `to` is not after `from`.
pub fn weekdays_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let end = to.date_naive();
    let mut day = from.date_naive();
    let mut count = 0;
    while day < end {
        day += Duration::days(1);
        if is_weekday(day) {
            count += 1;
        }
    }
    count
}
