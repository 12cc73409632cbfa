use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AstronautError, UserError};

const NOT_AUTHORIZED: &str = "not authorized";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(Vec<String>),

    Conflict(String),

    Timeout,

    InternalError(String),

    Unauthorized,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(errors) => write!(f, "Validation error: {}", errors.join("; ")),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Timeout => write!(f, "Store deadline exceeded"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error(msg)),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("a database error occurred"),
                )
            }
            Self::ValidationError(errors) => (StatusCode::BAD_REQUEST, ApiResponse::invalid(errors)),
            Self::Conflict(msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, ApiResponse::error("resource already exists"))
            }
            Self::Timeout => {
                tracing::warn!("Store deadline exceeded");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ApiResponse::error("the request timed out"),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("an internal error occurred"),
                )
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, ApiResponse::error(NOT_AUTHORIZED)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

// Extractor rejections answer in the same envelope as every other 400.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(format!("path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(format!("query: {}", rejection.body_text()))
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(errors) => Self::ValidationError(errors),
            UserError::Unauthorized => Self::Unauthorized,
            UserError::NotFound => Self::NotFound("user not found".to_string()),
            UserError::Conflict(detail) => Self::Conflict(detail),
            UserError::Timeout => Self::Timeout,
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AstronautError> for ApiError {
    fn from(err: AstronautError) -> Self {
        match err {
            AstronautError::Validation(errors) => Self::ValidationError(errors),
            AstronautError::Unauthorized => Self::Unauthorized,
            AstronautError::NotFound => Self::NotFound("astronaut not found".to_string()),
            AstronautError::Conflict(detail) => Self::Conflict(detail),
            AstronautError::Timeout => Self::Timeout,
            AstronautError::Database(msg) => Self::DatabaseError(msg),
            AstronautError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(vec![msg.into()])
    }
}
