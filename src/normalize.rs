//! Boundary between the document store and the core. Store documents are
//! loose JSON bags; everything past this module carries strict types with no
//! optional fields.

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{AttendanceRecord, InternProfile, MeetingNote, SocialLinks};

fn date_field(doc: &Value, key: &str) -> Option<NaiveDate> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn str_field(doc: &Value, key: &str) -> String {
    doc.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(doc: &Value, key: &str) -> bool {
    doc.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn link_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A record without a parseable date or a user id carries no attendance
/// information; it is dropped rather than defaulted. A missing `present`
/// field is falsy.
pub fn attendance_from_doc(id: &str, doc: &Value) -> Option<AttendanceRecord> {
    let date = date_field(doc, "date");
    let user_id = doc.get("userId").and_then(Value::as_str);
    let (Some(date), Some(user_id)) = (date, user_id) else {
        log::debug!("dropping malformed attendance doc {id}");
        return None;
    };

    Some(AttendanceRecord {
        id: id.to_string(),
        date,
        user_id: user_id.to_string(),
        present: bool_field(doc, "present"),
    })
}

/// Total: every document yields a profile. Display name falls back from
/// `name` to `email` to the uid.
pub fn profile_from_doc(uid: &str, doc: &Value) -> InternProfile {
    let email = str_field(doc, "email");
    let name = match doc.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ if !email.is_empty() => email.clone(),
        _ => uid.to_string(),
    };

    let social = doc.get("social").cloned().unwrap_or(Value::Null);

    InternProfile {
        uid: uid.to_string(),
        name,
        email,
        position: str_field(doc, "position"),
        is_student: bool_field(doc, "isStudent"),
        has_wifi: bool_field(doc, "hasWifi"),
        social: SocialLinks {
            github: link_field(&social, "github"),
            linkedin: link_field(&social, "linkedin"),
            instagram: link_field(&social, "instagram"),
            website: link_field(&social, "website"),
        },
    }
}

/// Notes without a date key nothing and are dropped; missing text reads as
/// an empty annotation.
pub fn note_from_doc(doc: &Value) -> Option<MeetingNote> {
    Some(MeetingNote {
        date: date_field(doc, "date")?,
        text: str_field(doc, "text"),
    })
}

/// Display order: case-insensitive by name, empty names last.
pub fn sort_roster(roster: &mut [InternProfile]) {
    roster.sort_by_key(|p| (p.name.is_empty(), p.name.to_lowercase()));
}
