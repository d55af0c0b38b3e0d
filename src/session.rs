//! Session context threaded explicitly through commands: created on
//! sign-in, torn down on sign-out.

use serde_json::Value;
use sqlx::PgPool;

use crate::db;
use crate::models::InternProfile;
use crate::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Intern,
    Moderator,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::Intern,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// An unset allowlist admits everyone; otherwise membership is by
/// case-insensitive email comparison.
pub fn email_allowed(allowlist: Option<&str>, email: &str) -> bool {
    match allowlist {
        None => true,
        Some(list) => list
            .split(',')
            .map(str::trim)
            .any(|entry| entry.eq_ignore_ascii_case(email)),
    }
}

impl Session {
    /// Signs in by email. First sign-in creates a minimal intern profile,
    /// matching the portal's onboarding behavior.
    pub async fn sign_in(pool: &PgPool, email: &str) -> anyhow::Result<Session> {
        let allowlist = std::env::var("ALLOWED_EMAILS").ok();
        if !email_allowed(allowlist.as_deref(), email) {
            anyhow::bail!("this portal is for internship candidates only; access denied");
        }

        let (uid, doc) = db::ensure_profile(pool, email, None).await?;
        let role = Role::parse(doc.get("role").and_then(Value::as_str).unwrap_or("intern"));
        let profile = normalize::profile_from_doc(&uid, &doc);
        log::info!("signed in {email} with role {role:?}");

        Ok(Session {
            uid,
            email: email.to_string(),
            name: profile.name,
            role,
        })
    }

    pub fn can_view_reports(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Moderator)
    }

    /// Picks up a demotion from a delivered roster snapshot: the roster is
    /// scoped to interns, so a privileged session appearing in it has been
    /// downgraded. Promotions require a fresh sign-in.
    pub fn refresh_role(&mut self, roster: &[InternProfile]) {
        if self.can_view_reports() && roster.iter().any(|profile| profile.uid == self.uid) {
            log::info!("role for {} changed to intern", self.email);
            self.role = Role::Intern;
        }
    }

    pub fn sign_out(self) {
        log::info!("signed out {}", self.email);
    }
}
