//! Business-day arithmetic for the resolved-ticket auto-close policy.
//!
//! A business day is any calendar date (UTC) that is not a Saturday or
//! Sunday. Holidays are not modelled.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::types::Timestamp;

/// Whether `date` falls on Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count business days elapsed between two instants.
///
/// Counts the weekday calendar dates strictly after `from`'s date, up to and
/// including `to`'s date. A ticket resolved on Friday evening has 0 business
/// days elapsed over the weekend and 1 on Monday morning.
pub fn business_days_elapsed(from: Timestamp, to: Timestamp) -> i64 {
    let from_date = from.date_naive();
    let to_date = to.date_naive();

    let total_days = (to_date - from_date).num_days();
    if total_days <= 0 {
        return 0;
    }

    // Every run of 7 consecutive dates holds exactly 5 weekdays.
    let full_weeks = total_days / 7;
    let mut count = full_weeks * 5;

    let mut day = from_date + Duration::days(full_weeks * 7);
    for _ in 0..(total_days % 7) {
        day += Duration::days(1);
        if is_business_day(day) {
            count += 1;
        }
    }

    count
}

/// Whether at least `window` business days have elapsed since `from`.
pub fn has_elapsed_business_days(from: Timestamp, now: Timestamp, window: i64) -> bool {
    business_days_elapsed(from, now) >= window
}

/// Instant `days` calendar days before `now`.
pub fn calendar_cutoff(now: Timestamp, days: i64) -> Timestamp {
    now - Duration::days(days)
}
