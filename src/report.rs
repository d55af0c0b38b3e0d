use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate;
use crate::alerts;
use crate::calendar;
use crate::models::{AttendanceRecord, InternProfile, MeetingNote, Tally, YearMonth};

pub const DAY_NAMES: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

#[derive(Debug, Clone, Copy)]
pub enum ReportPeriod {
    Week(NaiveDate),
    Month(YearMonth),
}

fn mark(present: Option<bool>) -> &'static str {
    match present {
        Some(true) => "P",
        Some(false) => "A",
        None => "-",
    }
}

fn tally_cell(tally: Option<Tally>) -> String {
    match tally {
        Some(t) if t.total > 0 => {
            format!("{}/{} {}%", t.present, t.total, aggregate::percentage(t))
        }
        _ => "-".to_string(),
    }
}

fn alert_block(out: &mut String, flagged: &[crate::models::LowAttendance]) {
    if flagged.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "Low attendance: {} intern(s) below {}%",
        flagged.len(),
        alerts::LOW_ATTENDANCE_THRESHOLD
    );
    for entry in flagged {
        let severity = if alerts::is_critical(entry) {
            " [critical]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "- {} {}/{} {}%{}",
            entry.name, entry.present, entry.total, entry.pct, severity
        );
    }
    let _ = writeln!(out);
}

pub fn week_overview(
    roster: &[InternProfile],
    records: &[AttendanceRecord],
    notes: &[MeetingNote],
    week_start: NaiveDate,
) -> String {
    let stats = aggregate::week_stats(records, week_start);
    let dates = calendar::week_dates(week_start);

    let mut out = String::new();
    let _ = writeln!(out, "Week of {week_start}");
    if let Some(note) = notes.iter().find(|n| n.date == week_start) {
        let _ = writeln!(out, "MoM: {}", note.text);
    }
    let _ = writeln!(out);

    alert_block(&mut out, &alerts::low_attendance(roster, &stats.tallies));

    if roster.is_empty() {
        let _ = writeln!(out, "No interns found");
        return out;
    }

    let _ = write!(out, "{:<28}", "Name");
    for day in DAY_NAMES {
        let _ = write!(out, " {day:>4}");
    }
    let _ = writeln!(out, "  {:>10}", "Week");

    for intern in roster {
        let _ = write!(out, "{:<28}", intern.name);
        for date in dates {
            let present = stats
                .by_date
                .get(&date)
                .and_then(|by_user| by_user.get(&intern.uid))
                .copied();
            let _ = write!(out, " {:>4}", mark(present));
        }
        let tally = stats.tallies.get(&intern.uid).copied().unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:>10}",
            format!("{}/{} {}%", tally.present, tally.total, aggregate::percentage(tally))
        );
    }

    out
}

pub fn month_overview(
    roster: &[InternProfile],
    records: &[AttendanceRecord],
    month: YearMonth,
) -> String {
    let stats = aggregate::month_stats(records, month);

    let mut out = String::new();
    let _ = writeln!(out, "Month {month}");
    let _ = writeln!(out);

    alert_block(&mut out, &alerts::low_attendance(roster, &stats.totals));

    if roster.is_empty() {
        let _ = writeln!(out, "No interns found");
        return out;
    }

    let _ = write!(out, "{:<28}", "Name");
    for (idx, ws) in stats.week_starts.iter().enumerate() {
        let _ = write!(out, " {:>12}", format!("W{} {}", idx + 1, ws.format("%m-%d")));
    }
    let _ = writeln!(out, "  {:>10}", "Month");

    for intern in roster {
        let _ = write!(out, "{:<28}", intern.name);
        for ws in &stats.week_starts {
            let tally = stats
                .per_week
                .get(ws)
                .and_then(|by_user| by_user.get(&intern.uid))
                .copied();
            let _ = write!(out, " {:>12}", tally_cell(tally));
        }
        let total = stats.totals.get(&intern.uid).copied().unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:>10}",
            format!("{}/{} {}%", total.present, total.total, aggregate::percentage(total))
        );
    }

    out
}

pub fn roster_overview(roster: &[InternProfile]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Intern directory ({} interns)", roster.len());

    if roster.is_empty() {
        let _ = writeln!(out, "No interns found");
        return out;
    }

    for intern in roster {
        let mut badges = String::new();
        if intern.is_student {
            badges.push_str(" [student]");
        }
        if intern.has_wifi {
            badges.push_str(" [wifi]");
        }
        let _ = writeln!(
            out,
            "- {} ({}, {}){}",
            intern.name, intern.position, intern.email, badges
        );
        if let Some(github) = &intern.social.github {
            let _ = writeln!(out, "  github: {github}");
        }
        if let Some(linkedin) = &intern.social.linkedin {
            let _ = writeln!(out, "  linkedin: {linkedin}");
        }
    }

    out
}

pub fn build_report(
    roster: &[InternProfile],
    records: &[AttendanceRecord],
    notes: &[MeetingNote],
    period: ReportPeriod,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Internship Attendance Report");
    match period {
        ReportPeriod::Week(ws) => {
            let _ = writeln!(output, "Period: week of {ws}");
        }
        ReportPeriod::Month(ym) => {
            let _ = writeln!(output, "Period: {ym}");
        }
    }
    let _ = writeln!(output);

    let tallies = match period {
        ReportPeriod::Week(ws) => aggregate::week_stats(records, ws).tallies,
        ReportPeriod::Month(ym) => aggregate::month_stats(records, ym).totals,
    };
    let flagged = alerts::low_attendance(roster, &tallies);

    let _ = writeln!(output, "## Low Attendance");
    if flagged.is_empty() {
        let _ = writeln!(
            output,
            "All interns at or above {}%.",
            alerts::LOW_ATTENDANCE_THRESHOLD
        );
    } else {
        for entry in &flagged {
            let severity = if alerts::is_critical(entry) {
                ", critical"
            } else {
                ""
            };
            let _ = writeln!(
                output,
                "- {}: {}/{} ({}%{})",
                entry.name, entry.present, entry.total, entry.pct, severity
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    if roster.is_empty() {
        let _ = writeln!(output, "No interns found.");
    } else {
        match period {
            ReportPeriod::Week(ws) => write_week_table(&mut output, roster, records, ws),
            ReportPeriod::Month(ym) => write_month_table(&mut output, roster, records, ym),
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Meeting Notes");
    if notes.is_empty() {
        let _ = writeln!(output, "No meeting notes recorded.");
    } else {
        for note in notes.iter().take(5) {
            let _ = writeln!(output, "- {}: {}", note.date, note.text);
        }
    }

    output
}

fn write_week_table(
    output: &mut String,
    roster: &[InternProfile],
    records: &[AttendanceRecord],
    week_start: NaiveDate,
) {
    let stats = aggregate::week_stats(records, week_start);
    let dates = calendar::week_dates(week_start);

    let _ = writeln!(
        output,
        "| Intern | {} | Total | % |",
        DAY_NAMES.join(" | ")
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
    for intern in roster {
        let _ = write!(output, "| {} |", intern.name);
        for date in dates {
            let present = stats
                .by_date
                .get(&date)
                .and_then(|by_user| by_user.get(&intern.uid))
                .copied();
            let _ = write!(output, " {} |", mark(present));
        }
        let tally = stats.tallies.get(&intern.uid).copied().unwrap_or_default();
        let _ = writeln!(
            output,
            " {}/{} | {}% |",
            tally.present,
            tally.total,
            aggregate::percentage(tally)
        );
    }
}

fn write_month_table(
    output: &mut String,
    roster: &[InternProfile],
    records: &[AttendanceRecord],
    month: YearMonth,
) {
    let stats = aggregate::month_stats(records, month);

    let _ = write!(output, "| Intern |");
    for (idx, _) in stats.week_starts.iter().enumerate() {
        let _ = write!(output, " W{} |", idx + 1);
    }
    let _ = writeln!(output, " Total | % |");

    let _ = write!(output, "|---|");
    for _ in 0..stats.week_starts.len() + 2 {
        let _ = write!(output, "---|");
    }
    let _ = writeln!(output);

    for intern in roster {
        let _ = write!(output, "| {} |", intern.name);
        for ws in &stats.week_starts {
            let tally = stats
                .per_week
                .get(ws)
                .and_then(|by_user| by_user.get(&intern.uid))
                .copied();
            let _ = write!(output, " {} |", tally_cell(tally));
        }
        let total = stats.totals.get(&intern.uid).copied().unwrap_or_default();
        let _ = writeln!(
            output,
            " {}/{} | {}% |",
            total.present,
            total.total,
            aggregate::percentage(total)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, uid: &str, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{uid}-{d}"),
            date: d,
            user_id: uid.to_string(),
            present,
        }
    }

    fn roster() -> Vec<InternProfile> {
        vec![
            normalize::profile_from_doc("alice", &json!({ "name": "Alice" })),
            normalize::profile_from_doc("bob", &json!({ "name": "Bob" })),
        ]
    }

    fn records() -> Vec<AttendanceRecord> {
        vec![
            record(date(2025, 3, 3), "alice", true),
            record(date(2025, 3, 3), "bob", false),
            record(date(2025, 3, 4), "alice", true),
        ]
    }

    #[test]
    fn week_overview_marks_and_summarizes() {
        let out = week_overview(&roster(), &records(), &[], date(2025, 3, 3));
        assert!(out.contains("Week of 2025-03-03"));
        assert!(out.contains("2/2 100%"));
        assert!(out.contains("0/1 0%"));
        assert!(out.contains("Low attendance: 1 intern(s) below 95%"));
        assert!(out.contains("- Bob 0/1 0% [critical]"));
    }

    #[test]
    fn interns_without_records_still_render_at_zero_percent() {
        let mut full = roster();
        full.push(normalize::profile_from_doc("carol", &json!({ "name": "Carol" })));
        let out = week_overview(&full, &records(), &[], date(2025, 3, 3));
        let carol_line = out.lines().find(|l| l.starts_with("Carol")).unwrap();
        assert!(carol_line.contains("0/0 0%"));
        // Carol has no data, so she is never part of the alert list.
        assert!(!out.contains("- Carol"));
    }

    #[test]
    fn week_overview_without_roster_reports_empty_state() {
        let out = week_overview(&[], &records(), &[], date(2025, 3, 3));
        assert!(out.contains("No interns found"));
    }

    #[test]
    fn week_overview_includes_matching_mom_note() {
        let notes = vec![MeetingNote {
            date: date(2025, 3, 3),
            text: "kickoff".to_string(),
        }];
        let out = week_overview(&roster(), &records(), &notes, date(2025, 3, 3));
        assert!(out.contains("MoM: kickoff"));

        let out = week_overview(&roster(), &records(), &notes, date(2025, 3, 10));
        assert!(!out.contains("MoM:"));
    }

    #[test]
    fn month_overview_shows_dash_for_empty_weeks() {
        let out = month_overview(&roster(), &records(), "2025-03".parse().unwrap());
        assert!(out.contains("Month 2025-03"));
        assert!(out.contains("-"));
        assert!(out.contains("2/2 100%"));
    }

    #[test]
    fn markdown_report_carries_alerts_and_notes() {
        let notes = vec![MeetingNote {
            date: date(2025, 3, 3),
            text: "kickoff".to_string(),
        }];
        let out = build_report(
            &roster(),
            &records(),
            &notes,
            ReportPeriod::Week(date(2025, 3, 3)),
        );
        assert!(out.starts_with("# Internship Attendance Report"));
        assert!(out.contains("## Low Attendance"));
        assert!(out.contains("- Bob: 0/1 (0%, critical)"));
        assert!(out.contains("| Alice | P | P | - | - | - | 2/2 | 100% |"));
        assert!(out.contains("- 2025-03-03: kickoff"));
    }

    #[test]
    fn markdown_report_with_no_flags_says_so() {
        let records = vec![record(date(2025, 3, 3), "alice", true)];
        let out = build_report(
            &roster(),
            &records,
            &[],
            ReportPeriod::Week(date(2025, 3, 3)),
        );
        assert!(out.contains("All interns at or above 95%."));
        assert!(out.contains("No meeting notes recorded."));
    }
}
