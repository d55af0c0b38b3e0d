use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

/// One check-in document. Immutable once written; at most one per intern per
/// calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: String,
    pub date: NaiveDate,
    pub user_id: String,
    pub present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

/// Roster entry, already normalized: `name` is never empty (falls back to
/// email, then to the uid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub position: String,
    pub is_student: bool,
    pub has_wifi: bool,
    pub social: SocialLinks,
}

/// Minutes-of-meeting note, keyed by the week-start date it annotates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingNote {
    pub date: NaiveDate,
    pub text: String,
}

/// Presence counts for one intern within one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub present: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowAttendance {
    pub uid: String,
    pub name: String,
    pub present: u32,
    pub total: u32,
    pub pct: u32,
}

/// A calendar month, carried as its first day so the year/month pair is
/// validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<YearMonth> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| YearMonth { first })
    }

    pub fn of(date: NaiveDate) -> YearMonth {
        YearMonth {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.first.year() && date.month() == self.first.month()
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in {s:?}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in {s:?}"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("{s:?} is not a calendar month"))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_parses_and_displays() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(ym.to_string(), "2025-03");
    }

    #[test]
    fn year_month_rejects_garbage() {
        assert!("2025".parse::<YearMonth>().is_err());
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("2025-xx".parse::<YearMonth>().is_err());
    }

    #[test]
    fn year_month_contains_only_its_days() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        assert!(ym.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
        assert!(!ym.contains(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()));
        assert!(!ym.contains(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
    }
}
