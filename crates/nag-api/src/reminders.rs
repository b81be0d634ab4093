use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use nag_db::models::{NewReminder, ReminderPatch};
use nag_types::api::{Claims, CreateReminderRequest, MessageResponse, UpdateReminderRequest};

use crate::auth::{AppState, AppStateInner, blocking};
use crate::error::ApiError;
use crate::policy::Action;
use crate::views;

const MAX_TITLE: usize = 200;

fn validate_title(title: &str) -> Result<(), ApiError> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE {
        return Err(ApiError::Validation(format!(
            "title must be between 1 and {} characters",
            MAX_TITLE
        )));
    }
    Ok(())
}

/// Loads the reminder and checks the caller may change it.
fn authorize_modify(s: &AppStateInner, claims: &Claims, reminder_id: i64) -> Result<(), ApiError> {
    let reminder = s
        .db
        .get_reminder(reminder_id)?
        .ok_or(ApiError::ReminderNotFound)?;
    let group_owner_id = s.db.get_group(reminder.group_id)?.map(|g| g.created_by);

    s.policy.authorize(
        claims,
        Action::ModifyReminder {
            creator_id: reminder.created_by,
            group_owner_id,
        },
    )
}

pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(group_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<CreateReminderRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&req.title)?;
    state.policy.authorize(&claims, Action::CreateReminder)?;

    let new = NewReminder {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
    };
    let reminder = blocking(&state, move |s| {
        Ok(s.db.create_reminder(group_id, claims.user_id, &new)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(views::reminder(reminder))))
}

/// Reminders of a group, newest first.
pub async fn list_group_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(group_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    state.policy.authorize(&claims, Action::ReadReminders)?;

    let rows = blocking(&state, move |s| Ok(s.db.list_group_reminders(group_id)?)).await?;

    Ok(Json(rows.into_iter().map(views::reminder).collect::<Vec<_>>()))
}

pub async fn update_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(reminder_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateReminderRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = ReminderPatch {
        title: req.title,
        description: req.description,
        completed: req.completed,
        due_date: req.due_date,
    };
    let reminder = blocking(&state, move |s| {
        authorize_modify(s, &claims, reminder_id)?;
        Ok(s.db.update_reminder(reminder_id, patch)?)
    })
    .await?;

    Ok(Json(views::reminder(reminder)))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(reminder_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |s| {
        authorize_modify(s, &claims, reminder_id)?;
        Ok(s.db.delete_reminder(reminder_id)?)
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "Reminder deleted successfully".into(),
    }))
}
