//! Database row types. These map directly to SQLite rows and are kept
//! separate from the nag-types API models so the DB layer stays independent.

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A group joined with its creator.
#[derive(Debug)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub creator_username: String,
    pub creator_created_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A reminder joined with its creator.
#[derive(Debug)]
pub struct ReminderRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub group_id: i64,
    pub created_by: i64,
    pub creator_username: String,
    pub creator_created_at: String,
    pub completed: bool,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewReminder {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

/// Fields to change on a reminder. `None` means "leave as stored".
#[derive(Debug, Default, Clone)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
}

impl ReminderPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
    }
}

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that
/// lexical order matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    raw.parse::<DateTime<Utc>>()
}

pub(crate) fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
