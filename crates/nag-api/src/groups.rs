use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use nag_types::api::{Claims, CreateGroupRequest, MessageResponse};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::policy::Action;
use crate::views;

const MAX_GROUP_NAME: usize = 100;

pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateGroupRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let len = req.name.chars().count();
    if len == 0 || len > MAX_GROUP_NAME {
        return Err(ApiError::Validation(format!(
            "name must be between 1 and {} characters",
            MAX_GROUP_NAME
        )));
    }

    state.policy.authorize(&claims, Action::CreateGroup)?;

    let group = blocking(&state, move |s| Ok(s.db.create_group(&req.name, claims.user_id)?)).await?;

    Ok((StatusCode::CREATED, Json(views::group(group))))
}

/// Every group, regardless of who created it.
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.policy.authorize(&claims, Action::ReadGroups)?;

    let rows = blocking(&state, |s| Ok(s.db.list_groups()?)).await?;

    Ok(Json(rows.into_iter().map(views::group).collect::<Vec<_>>()))
}

pub async fn get_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(group_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    state.policy.authorize(&claims, Action::ReadGroups)?;

    let group = blocking(&state, move |s| {
        s.db.get_group(group_id)?.ok_or(ApiError::GroupNotFound)
    })
    .await?;

    Ok(Json(views::group(group)))
}

/// Deletes the group and all of its reminders.
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(group_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = blocking(&state, move |s| {
        let group = s.db.get_group(group_id)?.ok_or(ApiError::GroupNotFound)?;
        s.policy.authorize(
            &claims,
            Action::DeleteGroup {
                owner_id: group.created_by,
            },
        )?;
        Ok(s.db.delete_group(group_id)?)
    })
    .await?;

    info!("Deleted group {} and {} reminder(s)", group_id, removed);

    Ok(Json(MessageResponse {
        message: "Group deleted successfully".into(),
    }))
}
