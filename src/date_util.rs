use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// Count business days (Mon-Fri) from `start` up to but excluding `end`.
///
/// Walks the span one calendar day at a time starting at `start`, counting
/// every weekday the cursor lands on while it is still before `end`. Weekends
/// never count; holidays are not modeled. `start >= end` yields 0.
pub fn business_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let mut count = 0;
    let mut current = start;
    while current < end {
        let day = current.weekday();
        if day != Weekday::Sat && day != Weekday::Sun {
            count += 1;
        }
        current += Duration::days(1);
    }
    count
}

/// Format a date as `M/D` for compact report strings.
pub fn format_short_date(date: chrono::NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}
