use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::RequestUser;
use super::validation::{validate_id, validate_limit};
use super::{ApiError, ApiResponse, AppState, ListQuery};
use crate::models::{NewUser, PasswordReset, UserUpdate};

/// `POST /api/v1/users`. Open to anonymous callers.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let Json(payload) = payload?;
    let user = state.users().create(None, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::user(user))))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Query(query) = query?;
    let server = &state.config().server;
    let limit = validate_limit(
        query.limit.unwrap_or(server.default_page_size),
        server.max_page_size,
    )?;

    let users = state
        .users()
        .list(Some(&caller), limit, query.offset.unwrap_or(0))
        .await?;

    Ok(Json(ApiResponse::users(users)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let id = validate_id("user", id)?;
    let user = state.users().get(Some(&caller), id).await?;
    Ok(Json(ApiResponse::user(user)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let id = validate_id("user", id)?;
    let user = state.users().update(Some(&caller), id, payload).await?;
    Ok(Json(ApiResponse::user(user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let id = validate_id("user", id)?;
    state.users().delete(Some(&caller), id).await?;
    Ok(Json(ApiResponse::message("user deleted")))
}

/// `PUT /api/v1/users/{id}/password`. Self only.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<PasswordReset>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let id = validate_id("user", id)?;
    state
        .users()
        .reset_password(Some(&caller), id, &payload.password)
        .await?;
    Ok(Json(ApiResponse::message("password updated")))
}

/// `POST /api/v1/users/{id}/api-key`. Self only; the old key stops working.
pub async fn rotate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let id = validate_id("user", id)?;
    let user = state.users().generate_new_api_key(Some(&caller), id).await?;
    Ok(Json(ApiResponse::user(user)))
}
