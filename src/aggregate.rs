use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::calendar;
use crate::models::{AttendanceRecord, Tally, YearMonth};

/// Weekly view input: per-intern tallies plus a date -> intern -> present
/// lookup. Interns with no records in the window are absent from both maps,
/// which the view renders as "no data" rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekStats {
    pub tallies: HashMap<String, Tally>,
    pub by_date: HashMap<NaiveDate, HashMap<String, bool>>,
}

/// Monthly view input, all built in one pass over the records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthStats {
    pub per_week: HashMap<NaiveDate, HashMap<String, Tally>>,
    pub totals: HashMap<String, Tally>,
    pub week_starts: Vec<NaiveDate>,
}

/// Rounded presence percentage. A zero total is "no data" and reads as 0
/// without dividing.
pub fn percentage(tally: Tally) -> u32 {
    if tally.total == 0 {
        return 0;
    }
    ((tally.present as f64 / tally.total as f64) * 100.0).round() as u32
}

pub fn week_stats(records: &[AttendanceRecord], week_start: NaiveDate) -> WeekStats {
    let window: HashSet<NaiveDate> = calendar::week_dates(week_start).into_iter().collect();
    let mut stats = WeekStats::default();

    for record in records {
        if !window.contains(&record.date) {
            continue;
        }
        let tally = stats.tallies.entry(record.user_id.clone()).or_default();
        tally.total += 1;
        if record.present {
            tally.present += 1;
        }
        stats
            .by_date
            .entry(record.date)
            .or_default()
            .insert(record.user_id.clone(), record.present);
    }

    stats
}

pub fn month_stats(records: &[AttendanceRecord], month: YearMonth) -> MonthStats {
    let mut stats = MonthStats {
        week_starts: calendar::weeks_for_month(month),
        ..MonthStats::default()
    };

    for record in records {
        if !month.contains(record.date) {
            continue;
        }
        // Bucket key is the record's Monday even when that Monday falls in
        // the previous month.
        let ws = calendar::week_start(record.date);
        let weekly = stats
            .per_week
            .entry(ws)
            .or_default()
            .entry(record.user_id.clone())
            .or_default();
        weekly.total += 1;
        if record.present {
            weekly.present += 1;
        }

        let monthly = stats.totals.entry(record.user_id.clone()).or_default();
        monthly.total += 1;
        if record.present {
            monthly.present += 1;
        }
    }

    stats
}
