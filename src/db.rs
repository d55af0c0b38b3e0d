use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{AttendanceRecord, InternProfile, MeetingNote};
use crate::normalize;

/// Role the attendance views are scoped to.
pub const ROSTER_ROLE: &str = "intern";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let interns = vec![
        (
            "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2",
            "Asha Venkat",
            "asha.venkat@example.com",
            "Fullstack Engineer Intern",
            "intern",
            true,
            true,
        ),
        (
            "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc",
            "Daniel Mora",
            "daniel.mora@example.com",
            "UXUI Engineer Intern",
            "intern",
            false,
            true,
        ),
        (
            "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2",
            "Priya Raghavan",
            "priya.raghavan@example.com",
            "Fullstack Engineer Intern",
            "intern",
            true,
            false,
        ),
        (
            "7f0b7f6e-5f2a-4f6d-9a3f-2d9b14c1f0aa",
            "Meera Iyer",
            "meera.iyer@example.com",
            "Program Coordinator",
            "admin",
            false,
            true,
        ),
    ];

    for (uid, name, email, position, role, is_student, has_wifi) in interns {
        let handle = name.split_whitespace().next().unwrap_or(name).to_lowercase();
        let doc = serde_json::json!({
            "uid": uid,
            "name": name,
            "email": email,
            "position": position,
            "role": role,
            "isStudent": is_student,
            "hasWifi": has_wifi,
            "social": { "github": format!("https://github.com/{handle}") },
        });
        sqlx::query(
            r#"
            INSERT INTO intern_portal.users (uid, doc)
            VALUES ($1, $2)
            ON CONFLICT (uid) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(uid)
        .bind(&doc)
        .execute(pool)
        .await?;
    }

    let week = NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid seed date")?;
    let checkins = vec![
        ("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2", 0, true),
        ("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2", 1, true),
        ("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", 0, true),
        ("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", 1, false),
        ("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2", 0, false),
    ];

    for (uid, offset, present) in checkins {
        check_in(pool, uid, week + chrono::Duration::days(offset), present).await?;
    }

    upsert_note(pool, week, "Sprint kickoff; demos moved to Friday.").await?;

    Ok(())
}

/// Wholesale snapshot of the attendance collection, newest first. Malformed
/// documents are dropped at the boundary.
pub async fn fetch_attendance(pool: &PgPool) -> anyhow::Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT id, doc FROM intern_portal.attendance ORDER BY doc->>'date' DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::new();
    for row in rows {
        let id: Uuid = row.get("id");
        let doc: Value = row.get("doc");
        if let Some(record) = normalize::attendance_from_doc(&id.to_string(), &doc) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Roster filtered to one role, sorted for display.
pub async fn fetch_roster(pool: &PgPool, role: &str) -> anyhow::Result<Vec<InternProfile>> {
    let rows = sqlx::query("SELECT uid, doc FROM intern_portal.users WHERE doc->>'role' = $1")
        .bind(role)
        .fetch_all(pool)
        .await?;

    let mut roster = Vec::new();
    for row in rows {
        let uid: String = row.get("uid");
        let doc: Value = row.get("doc");
        roster.push(normalize::profile_from_doc(&uid, &doc));
    }

    normalize::sort_roster(&mut roster);
    Ok(roster)
}

pub async fn fetch_notes(pool: &PgPool) -> anyhow::Result<Vec<MeetingNote>> {
    let rows = sqlx::query("SELECT doc FROM intern_portal.mom ORDER BY doc->>'date' DESC")
        .fetch_all(pool)
        .await?;

    let mut notes = Vec::new();
    for row in rows {
        let doc: Value = row.get("doc");
        if let Some(note) = normalize::note_from_doc(&doc) {
            notes.push(note);
        }
    }

    Ok(notes)
}

/// Records one check-in document. Returns false when the intern already has
/// a record for that date.
pub async fn check_in(
    pool: &PgPool,
    user_id: &str,
    date: NaiveDate,
    present: bool,
) -> anyhow::Result<bool> {
    let doc = serde_json::json!({
        "userId": user_id,
        "date": date.to_string(),
        "present": present,
        "checkInTime": Utc::now().to_rfc3339(),
    });

    let result = sqlx::query(
        r#"
        INSERT INTO intern_portal.attendance (id, doc)
        VALUES ($1, $2)
        ON CONFLICT ((doc->>'userId'), (doc->>'date')) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&doc)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Writes the minutes-of-meeting note for a week key, replacing any prior
/// note for the same key.
pub async fn upsert_note(pool: &PgPool, date: NaiveDate, text: &str) -> anyhow::Result<()> {
    let doc = serde_json::json!({ "date": date.to_string(), "text": text });
    sqlx::query(
        r#"
        INSERT INTO intern_portal.mom (id, doc)
        VALUES ($1, $2)
        ON CONFLICT ((doc->>'date')) DO UPDATE SET doc = EXCLUDED.doc
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&doc)
    .execute(pool)
    .await?;
    Ok(())
}

/// Looks up a profile by email, creating a minimal intern profile on first
/// sign-in. Returns the uid and the raw document.
pub async fn ensure_profile(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
) -> anyhow::Result<(String, Value)> {
    let existing = sqlx::query("SELECT uid, doc FROM intern_portal.users WHERE doc->>'email' = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = existing {
        return Ok((row.get("uid"), row.get("doc")));
    }

    let uid = Uuid::new_v4().to_string();
    let doc = serde_json::json!({
        "uid": uid,
        "email": email,
        "name": name,
        "role": "intern",
    });
    sqlx::query(
        r#"
        INSERT INTO intern_portal.users (uid, doc)
        VALUES ($1, $2)
        ON CONFLICT (uid) DO NOTHING
        "#,
    )
    .bind(&uid)
    .bind(&doc)
    .execute(pool)
    .await?;

    Ok((uid, doc))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        name: String,
        email: String,
        date: NaiveDate,
        present: bool,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let (uid, _) = ensure_profile(pool, &row.email, Some(&row.name)).await?;
        if check_in(pool, &uid, row.date, row.present).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
