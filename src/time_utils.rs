// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for dates, weekdays and local time.

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, Utc, Weekday};

/// en-US long weekday name ("Monday".."Sunday").
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Local wall-clock time for `now` in the given offset.
pub fn to_local(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    now.with_timezone(&offset)
}

/// Local calendar date (the `YYYY-MM-DD` used for per-day dedup).
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    to_local(now, offset).date_naive()
}

/// Local weekday name for `now`.
pub fn local_weekday_name(now: DateTime<Utc>, offset: FixedOffset) -> &'static str {
    weekday_name(to_local(now, offset).weekday())
}

/// Add calendar months, clamping to the last day of shorter months.
///
/// Returns `None` only when the result is out of chrono's date range.
pub fn add_calendar_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_weekday_names_are_en_us_long_form() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Wed), "Wednesday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        // 2024-05-01 17:30 UTC is already May 2 in UTC+8.
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 17, 30, 0).unwrap();
        assert_eq!(
            local_date(now, offset),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
        assert_eq!(local_weekday_name(now, offset), "Thursday");
    }

    #[test]
    fn test_add_calendar_months_clamps_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(
            add_calendar_months(jan31, 1),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
    }
}
