use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint rejected the write.
    #[error("Duplicate value for a unique column")]
    Duplicate,

    /// A `created_by` foreign key points at no user. Group existence is
    /// checked before every insert, so users are the only FK that can miss.
    #[error("Referenced user does not exist")]
    UnknownUser,

    #[error("Group not found")]
    GroupNotFound,

    #[error("Reminder not found")]
    ReminderNotFound,

    #[error("DB lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                DbError::Duplicate
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                DbError::UnknownUser
            }
            _ => DbError::Sqlite(err),
        }
    }
}
