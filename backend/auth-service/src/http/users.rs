/// User CRUD endpoints
use super::{envelope, AppState};
use crate::error::Result;
use crate::models::{UpdateUserRequest, UserResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

pub(super) async fn get_all_users(State(state): State<AppState>) -> Result<Response> {
    let users: Vec<UserResponse> = state
        .users
        .get_all_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(envelope(StatusCode::OK, "Get all users data", users))
}

pub(super) async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let user = state.users.get_user_by_id(id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Get user data",
        UserResponse::from(user),
    ))
}

pub(super) async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Response> {
    req.validate()?;
    let user = state
        .users
        .update_user(id, req.name.as_deref(), req.email.as_deref())
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Update user data",
        UserResponse::from(user),
    ))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let user = state.users.delete_user(id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Delete user data",
        UserResponse::from(user),
    ))
}
