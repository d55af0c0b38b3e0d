use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

use crate::models::YearMonth;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The Monday on or before `date`. Idempotent; never more than six days back.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday through Friday of the week beginning at `start`. Weekends are never
/// part of an attendance window.
pub fn week_dates(start: NaiveDate) -> [NaiveDate; 5] {
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// Every Monday whose week intersects the month: the Monday containing the
/// 1st, then every 7 days while still on or before the last calendar day.
/// Yields 4 to 6 entries depending on alignment.
pub fn weeks_for_month(month: YearMonth) -> Vec<NaiveDate> {
    let first = month.first_day();
    let last = match first.checked_add_months(Months::new(1)) {
        Some(next) => next - Duration::days(1),
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    let mut cur = week_start(first);
    while cur <= last {
        out.push(cur);
        cur += Duration::days(7);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_is_a_monday_within_six_days() {
        let mut d = date(2025, 1, 1);
        while d < date(2025, 4, 1) {
            let ws = week_start(d);
            assert_eq!(ws.weekday(), Weekday::Mon);
            let back = (d - ws).num_days();
            assert!((0..=6).contains(&back), "{d} -> {ws} is {back} days back");
            d += Duration::days(1);
        }
    }

    #[test]
    fn week_start_is_idempotent() {
        let d = date(2025, 3, 9);
        assert_eq!(week_start(week_start(d)), week_start(d));
    }

    #[test]
    fn week_start_of_sunday_goes_back_six_days() {
        assert_eq!(week_start(date(2025, 3, 9)), date(2025, 3, 3));
    }

    #[test]
    fn week_dates_are_five_consecutive_weekdays() {
        let dates = week_dates(date(2025, 3, 3));
        assert_eq!(dates.len(), 5);
        for (i, d) in dates.iter().enumerate() {
            assert_eq!(*d, date(2025, 3, 3) + Duration::days(i as i64));
        }
        assert_eq!(dates[0].weekday(), Weekday::Mon);
        assert_eq!(dates[4].weekday(), Weekday::Fri);
    }

    #[test]
    fn week_dates_contain_d_iff_weekday() {
        // Saturday and Sunday fall outside the window of their own week.
        for day in 3..=9 {
            let d = date(2025, 3, day);
            let in_window = week_dates(week_start(d)).contains(&d);
            let is_weekday = d.weekday().num_days_from_monday() < 5;
            assert_eq!(in_window, is_weekday, "{d}");
        }
    }

    #[test]
    fn weeks_for_march_2025_span_the_whole_month() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        let weeks = weeks_for_month(ym);
        assert_eq!(
            weeks,
            vec![
                date(2025, 2, 24),
                date(2025, 3, 3),
                date(2025, 3, 10),
                date(2025, 3, 17),
                date(2025, 3, 24),
                date(2025, 3, 31),
            ]
        );
    }

    #[test]
    fn month_ending_on_a_monday_includes_that_week() {
        // 2025-03-31 is a Monday and the last day of March.
        let weeks = weeks_for_month("2025-03".parse().unwrap());
        assert!(weeks.contains(&date(2025, 3, 31)));
    }

    #[test]
    fn month_starting_on_a_monday_needs_no_backfill() {
        // 2025-09-01 is a Monday.
        let weeks = weeks_for_month("2025-09".parse().unwrap());
        assert_eq!(weeks.first(), Some(&date(2025, 9, 1)));
        assert_eq!(weeks.len(), 5);
    }

    #[test]
    fn february_non_leap_can_have_four_weeks() {
        // Feb 2027: the 1st is a Monday and the month has exactly 28 days.
        let weeks = weeks_for_month("2027-02".parse().unwrap());
        assert_eq!(weeks.len(), 4);
    }
}
