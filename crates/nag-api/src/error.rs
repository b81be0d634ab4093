use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use nag_db::DbError;
use nag_types::api::ErrorResponse;

use crate::token::TokenError;

/// Every failure a request can end in. Handlers return this and the
/// `IntoResponse` impl turns it into a status code plus `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists")]
    DuplicateUsername,

    /// Unknown username and wrong password both land here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("You do not own this resource")]
    Forbidden,

    #[error("Group not found")]
    GroupNotFound,

    #[error("Reminder not found")]
    ReminderNotFound,

    /// Detail is logged server-side only.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::GroupNotFound | Self::ReminderNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Internal failure: {:#}", e);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            // users.username is the only unique column
            DbError::Duplicate => Self::DuplicateUsername,
            // Validly signed token for a user the store does not know
            DbError::UnknownUser => Self::Unauthenticated("Invalid token"),
            DbError::GroupNotFound => Self::GroupNotFound,
            DbError::ReminderNotFound => Self::ReminderNotFound,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        Self::Unauthenticated("Invalid token")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::Validation("Invalid id".into())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::anyhow!("spawn_blocking join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::DuplicateUsername.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::GroupNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Internal(anyhow::anyhow!("disk on fire at /var/lib/nag.db"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn db_errors_map_to_domain_errors() {
        assert!(matches!(ApiError::from(DbError::Duplicate), ApiError::DuplicateUsername));
        assert!(matches!(ApiError::from(DbError::ReminderNotFound), ApiError::ReminderNotFound));
        assert!(matches!(ApiError::from(DbError::LockPoisoned), ApiError::Internal(_)));
        assert_eq!(ApiError::from(DbError::UnknownUser).status(), StatusCode::UNAUTHORIZED);
    }
}
