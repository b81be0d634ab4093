use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::info;

use nag_db::Database;
use nag_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::credentials;
use crate::error::ApiError;
use crate::policy::Policy;
use crate::token::TokenService;
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub policy: Policy,
}

/// Run blocking DB work (and password hashing) off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.as_ref())).await?
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |s| {
        credentials::register(&s.db, &req.username, &req.password)
    })
    .await?;

    let token = state.tokens.issue(user.id, &user.username)?;
    info!("Registered user {} (id {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: views::user(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".into(),
        ));
    }

    let user = blocking(&state, move |s| {
        credentials::verify(&s.db, &req.username, &req.password)
    })
    .await?;

    let token = state.tokens.issue(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user: views::user(user),
    }))
}

/// The user behind the presented token.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |s| {
        s.db.get_user_by_id(claims.user_id)?
            .ok_or(ApiError::Unauthenticated("Invalid token"))
    })
    .await?;

    Ok(Json(views::user(user)))
}
