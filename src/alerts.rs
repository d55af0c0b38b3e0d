use std::collections::HashMap;

use crate::aggregate;
use crate::models::{InternProfile, LowAttendance, Tally};

/// Interns below this presence percentage are flagged for follow-up.
pub const LOW_ATTENDANCE_THRESHOLD: u32 = 95;

/// Flagged interns below this percentage are called out as critical. Display
/// only; does not change membership of the alert list.
pub const CRITICAL_ATTENDANCE_BREAK: u32 = 80;

/// Roster-driven alert list for the active period: interns with at least one
/// record whose percentage falls below the threshold, worst first.
pub fn low_attendance(
    roster: &[InternProfile],
    tallies: &HashMap<String, Tally>,
) -> Vec<LowAttendance> {
    let mut flagged: Vec<LowAttendance> = roster
        .iter()
        .filter_map(|intern| {
            let tally = *tallies.get(&intern.uid)?;
            if tally.total == 0 {
                return None;
            }
            let pct = aggregate::percentage(tally);
            if pct >= LOW_ATTENDANCE_THRESHOLD {
                return None;
            }
            Some(LowAttendance {
                uid: intern.uid.clone(),
                name: intern.name.clone(),
                present: tally.present,
                total: tally.total,
                pct,
            })
        })
        .collect();

    flagged.sort_by_key(|entry| entry.pct);
    flagged
}

pub fn is_critical(entry: &LowAttendance) -> bool {
    entry.pct < CRITICAL_ATTENDANCE_BREAK
}
