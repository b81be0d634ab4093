//! Row to API model conversion.

use chrono::{DateTime, Utc};
use tracing::warn;

use nag_db::models::{GroupRow, ReminderRow, UserRow, parse_timestamp};
use nag_types::models::{Creator, Group, Reminder, User};

fn timestamp(raw: &str, field: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row {}: {}", field, raw, id, e);
        DateTime::default()
    })
}

pub fn user(row: UserRow) -> User {
    User {
        id: row.id,
        created_at: timestamp(&row.created_at, "created_at", row.id),
        updated_at: timestamp(&row.updated_at, "updated_at", row.id),
        username: row.username,
    }
}

pub fn group(row: GroupRow) -> Group {
    Group {
        id: row.id,
        created_by: row.created_by,
        creator: Creator {
            id: row.created_by,
            created_at: timestamp(&row.creator_created_at, "created_at", row.created_by),
            username: row.creator_username,
        },
        created_at: timestamp(&row.created_at, "created_at", row.id),
        updated_at: timestamp(&row.updated_at, "updated_at", row.id),
        name: row.name,
    }
}

pub fn reminder(row: ReminderRow) -> Reminder {
    Reminder {
        id: row.id,
        group_id: row.group_id,
        created_by: row.created_by,
        creator: Creator {
            id: row.created_by,
            created_at: timestamp(&row.creator_created_at, "created_at", row.created_by),
            username: row.creator_username,
        },
        completed: row.completed,
        due_date: row
            .due_date
            .as_deref()
            .map(|raw| timestamp(raw, "due_date", row.id)),
        created_at: timestamp(&row.created_at, "created_at", row.id),
        updated_at: timestamp(&row.updated_at, "updated_at", row.id),
        title: row.title,
        description: row.description,
    }
}
