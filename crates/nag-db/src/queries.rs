use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::models::{
    GroupRow, NewReminder, ReminderPatch, ReminderRow, UserRow, format_timestamp, now_timestamp,
};
use crate::{Database, DbError, Result};

const SELECT_GROUP: &str = "SELECT g.id, g.name, g.created_by, u.username, u.created_at, g.created_at, g.updated_at
     FROM reminder_groups g
     JOIN users u ON u.id = g.created_by";

const SELECT_REMINDER: &str = "SELECT r.id, r.title, r.description, r.group_id, r.created_by, u.username, u.created_at,
            r.completed, r.due_date, r.created_at, r.updated_at
     FROM reminders r
     JOIN users u ON u.id = r.created_by";

impl Database {
    // -- Users --

    /// Inserts a user. A username that is already taken fails with
    /// [`DbError::Duplicate`] even when two registrations race, since the
    /// check is the UNIQUE constraint itself.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            let now = now_timestamp();
            conn.execute(
                "INSERT INTO users (username, password, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                (username, password_hash, &now),
            )?;

            Ok(UserRow {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password: password_hash.to_string(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Groups --

    pub fn create_group(&self, name: &str, creator_id: i64) -> Result<GroupRow> {
        self.with_conn(|conn| {
            let now = now_timestamp();
            conn.execute(
                "INSERT INTO reminder_groups (name, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                params![name, creator_id, now],
            )?;

            // Re-read so the creator is populated
            query_group(conn, conn.last_insert_rowid())?.ok_or(DbError::GroupNotFound)
        })
    }

    pub fn get_group(&self, id: i64) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, id))
    }

    /// All groups, oldest first.
    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_GROUP} ORDER BY g.id ASC"))?;
            let rows = stmt
                .query_map([], map_group)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a group and every reminder in it, atomically.
    /// Returns the number of reminders removed.
    pub fn delete_group(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !group_exists(&tx, id)? {
                return Err(DbError::GroupNotFound);
            }

            let removed = tx.execute("DELETE FROM reminders WHERE group_id = ?1", [id])?;
            tx.execute("DELETE FROM reminder_groups WHERE id = ?1", [id])?;
            tx.commit()?;

            Ok(removed)
        })
    }

    // -- Reminders --

    pub fn create_reminder(
        &self,
        group_id: i64,
        creator_id: i64,
        reminder: &NewReminder,
    ) -> Result<ReminderRow> {
        self.with_conn_mut(|conn| {
            // Existence check and insert share a transaction so a concurrent
            // group delete cannot leave this reminder orphaned.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !group_exists(&tx, group_id)? {
                return Err(DbError::GroupNotFound);
            }

            let now = now_timestamp();
            tx.execute(
                "INSERT INTO reminders (title, description, group_id, created_by, completed, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?6)",
                params![
                    reminder.title,
                    reminder.description,
                    group_id,
                    creator_id,
                    reminder.due_date.map(format_timestamp),
                    now,
                ],
            )?;

            let row = query_reminder(&tx, tx.last_insert_rowid())?.ok_or(DbError::ReminderNotFound)?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_reminder(&self, id: i64) -> Result<Option<ReminderRow>> {
        self.with_conn(|conn| query_reminder(conn, id))
    }

    /// Reminders of a group, newest first.
    pub fn list_group_reminders(&self, group_id: i64) -> Result<Vec<ReminderRow>> {
        self.with_conn(|conn| {
            if !group_exists(conn, group_id)? {
                return Err(DbError::GroupNotFound);
            }

            let mut stmt = conn.prepare(&format!(
                "{SELECT_REMINDER} WHERE r.group_id = ?1 ORDER BY r.created_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map([group_id], map_reminder)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies only the fields present in `patch`. An empty patch is a no-op
    /// that still returns the current row.
    pub fn update_reminder(&self, id: i64, patch: ReminderPatch) -> Result<ReminderRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut row = query_reminder(&tx, id)?.ok_or(DbError::ReminderNotFound)?;
            if patch.is_empty() {
                return Ok(row);
            }

            if let Some(title) = patch.title {
                row.title = title;
            }
            if let Some(description) = patch.description {
                row.description = description;
            }
            if let Some(completed) = patch.completed {
                row.completed = completed;
            }
            if let Some(due_date) = patch.due_date {
                row.due_date = Some(format_timestamp(due_date));
            }
            row.updated_at = now_timestamp();

            tx.execute(
                "UPDATE reminders
                 SET title = ?1, description = ?2, completed = ?3, due_date = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    row.title,
                    row.description,
                    row.completed,
                    row.due_date,
                    row.updated_at,
                    id,
                ],
            )?;
            tx.commit()?;

            Ok(row)
        })
    }

    pub fn delete_reminder(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM reminders WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(DbError::ReminderNotFound);
            }
            Ok(())
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, created_at, updated_at FROM users WHERE {filter}"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn group_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reminder_groups WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn query_group(conn: &Connection, id: i64) -> Result<Option<GroupRow>> {
    let row = conn
        .query_row(&format!("{SELECT_GROUP} WHERE g.id = ?1"), [id], map_group)
        .optional()?;
    Ok(row)
}

fn query_reminder(conn: &Connection, id: i64) -> Result<Option<ReminderRow>> {
    let row = conn
        .query_row(&format!("{SELECT_REMINDER} WHERE r.id = ?1"), [id], map_reminder)
        .optional()?;
    Ok(row)
}

fn map_group(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_by: row.get(2)?,
        creator_username: row.get(3)?,
        creator_created_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_reminder(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok(ReminderRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        group_id: row.get(3)?,
        created_by: row.get(4)?,
        creator_username: row.get(5)?,
        creator_created_at: row.get(6)?,
        completed: row.get(7)?,
        due_date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::parse_timestamp;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn count(db: &Database, sql: &str) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
            .unwrap()
    }

    fn reminder(title: &str) -> NewReminder {
        NewReminder {
            title: title.to_string(),
            description: String::new(),
            due_date: None,
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = db();
        db.create_user("alice", "hash").unwrap();

        let err = db.create_user("alice", "other-hash").unwrap_err();
        assert!(matches!(err, DbError::Duplicate));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 1);

        // Case-sensitive
        db.create_user("Alice", "hash").unwrap();
    }

    #[test]
    fn concurrent_registrations_yield_one_user() {
        let db = Arc::new(db());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || db.create_user("bob", "hash"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, DbError::Duplicate))
        );
    }

    #[test]
    fn group_is_reread_with_creator() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();

        let group = db.create_group("Chores", user.id).unwrap();
        assert_eq!(group.id, 1);
        assert_eq!(group.created_by, user.id);
        assert_eq!(group.creator_username, "alice");

        let fetched = db.get_group(group.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Chores");
        assert!(db.get_group(99).unwrap().is_none());
    }

    #[test]
    fn list_groups_returns_all_users_groups() {
        let db = db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();
        db.create_group("Chores", alice.id).unwrap();
        db.create_group("Errands", bob.id).unwrap();

        let names: Vec<_> = db.list_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Chores", "Errands"]);
    }

    #[test]
    fn reminder_under_missing_group_creates_nothing() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();

        let err = db.create_reminder(42, user.id, &reminder("Trash")).unwrap_err();
        assert!(matches!(err, DbError::GroupNotFound));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reminders"), 0);
    }

    #[test]
    fn new_reminder_defaults() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();

        let due = Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap();
        let row = db
            .create_reminder(
                group.id,
                user.id,
                &NewReminder {
                    title: "Trash".into(),
                    description: "Bins out".into(),
                    due_date: Some(due),
                },
            )
            .unwrap();

        assert!(!row.completed);
        assert_eq!(row.creator_username, "alice");
        assert_eq!(row.group_id, group.id);
        assert_eq!(parse_timestamp(row.due_date.as_deref().unwrap()).unwrap(), due);
    }

    #[test]
    fn deleting_group_cascades_reminders() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();
        let other = db.create_group("Errands", user.id).unwrap();

        for i in 0..5 {
            db.create_reminder(group.id, user.id, &reminder(&format!("r{i}")))
                .unwrap();
        }
        db.create_reminder(other.id, user.id, &reminder("keep")).unwrap();

        assert_eq!(db.delete_group(group.id).unwrap(), 5);
        assert!(db.get_group(group.id).unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reminders"), 1);
        assert!(matches!(
            db.list_group_reminders(group.id).unwrap_err(),
            DbError::GroupNotFound
        ));
    }

    #[test]
    fn writes_by_unknown_user_are_rejected() {
        let db = db();
        assert!(matches!(db.create_group("Chores", 99).unwrap_err(), DbError::UnknownUser));

        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();
        assert!(matches!(
            db.create_reminder(group.id, 99, &reminder("Trash")).unwrap_err(),
            DbError::UnknownUser
        ));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reminders"), 0);
    }

    #[test]
    fn deleting_missing_group_is_not_found() {
        let db = db();
        assert!(matches!(db.delete_group(7).unwrap_err(), DbError::GroupNotFound));
    }

    #[test]
    fn reminders_listed_newest_first() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();

        for title in ["first", "second", "third"] {
            db.create_reminder(group.id, user.id, &reminder(title)).unwrap();
        }

        let titles: Vec<_> = db
            .list_group_reminders(group.id)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[test]
    fn partial_update_touches_only_given_fields() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();
        let due = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let created = db
            .create_reminder(
                group.id,
                user.id,
                &NewReminder {
                    title: "Trash".into(),
                    description: "Bins".into(),
                    due_date: Some(due),
                },
            )
            .unwrap();

        let updated = db
            .update_reminder(
                created.id,
                ReminderPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Trash");
        assert_eq!(updated.description, "Bins");
        assert_eq!(updated.due_date, created.due_date);

        // Explicit empty string is a set, not an absence
        let cleared = db
            .update_reminder(
                created.id,
                ReminderPatch {
                    description: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.description, "");
        assert!(cleared.completed);

        let stored = db.get_reminder(created.id).unwrap().unwrap();
        assert_eq!(stored.description, "");
        assert!(stored.completed);
        assert_eq!(stored.title, "Trash");
    }

    #[test]
    fn update_and_delete_missing_reminder() {
        let db = db();
        assert!(matches!(
            db.update_reminder(3, ReminderPatch::default()).unwrap_err(),
            DbError::ReminderNotFound
        ));
        assert!(matches!(db.delete_reminder(3).unwrap_err(), DbError::ReminderNotFound));
    }

    #[test]
    fn delete_reminder_removes_row() {
        let db = db();
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();
        let row = db.create_reminder(group.id, user.id, &reminder("Trash")).unwrap();

        db.delete_reminder(row.id).unwrap();
        assert!(db.get_reminder(row.id).unwrap().is_none());
    }

    #[test]
    fn racing_create_and_group_delete_leave_no_orphans() {
        let db = Arc::new(db());
        let user = db.create_user("alice", "hash").unwrap();
        let group = db.create_group("Chores", user.id).unwrap();

        let creator = {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    match db.create_reminder(group.id, user.id, &reminder(&format!("r{i}"))) {
                        Ok(_) | Err(DbError::GroupNotFound) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        };
        let deleter = {
            let db = db.clone();
            thread::spawn(move || db.delete_group(group.id))
        };

        creator.join().unwrap();
        deleter.join().unwrap().unwrap();

        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM reminders WHERE group_id NOT IN (SELECT id FROM reminder_groups)"),
            0
        );
    }
}
