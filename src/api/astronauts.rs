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
use crate::models::{Astronaut, AstronautUpdate};

pub async fn create_astronaut(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    payload: Result<Json<Astronaut>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let Json(payload) = payload?;
    let astronaut = state.astronauts().create(Some(&caller), payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::astronaut(astronaut))))
}

pub async fn list_astronauts(
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

    let astronauts = state
        .astronauts()
        .list(Some(&caller), limit, query.offset.unwrap_or(0))
        .await?;

    Ok(Json(ApiResponse::astronauts(astronauts)))
}

pub async fn get_astronaut(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let id = validate_id("astronaut", id)?;
    let astronaut = state.astronauts().get(Some(&caller), id).await?;
    Ok(Json(ApiResponse::astronaut(astronaut)))
}

pub async fn update_astronaut(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<AstronautUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let id = validate_id("astronaut", id)?;
    let astronaut = state
        .astronauts()
        .update(Some(&caller), id, payload)
        .await?;
    Ok(Json(ApiResponse::astronaut(astronaut)))
}

pub async fn delete_astronaut(
    State(state): State<Arc<AppState>>,
    Extension(RequestUser(caller)): Extension<RequestUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Path(id) = id?;
    let id = validate_id("astronaut", id)?;
    state.astronauts().delete(Some(&caller), id).await?;
    Ok(Json(ApiResponse::message("astronaut deleted")))
}
