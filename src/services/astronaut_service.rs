//! Domain service for astronaut records.
//!
//! Any authenticated caller may read. Creating, updating and deleting
//! records requires an admin.

use thiserror::Error;

use crate::db::StoreError;
use crate::models::{Astronaut, AstronautUpdate, User};

/// Errors specific to astronaut operations.
#[derive(Debug, Error)]
pub enum AstronautError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Astronaut not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store deadline exceeded")]
    Timeout,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AstronautError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(detail) => Self::Conflict(detail),
            StoreError::Timeout => Self::Timeout,
            StoreError::Database(detail) => Self::Database(detail),
        }
    }
}

impl From<anyhow::Error> for AstronautError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait AstronautService: Send + Sync {
    /// Validates and stores a new record. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`AstronautError::Unauthorized`] for non-admin callers before
    /// the payload is looked at.
    async fn create(
        &self,
        caller: Option<&User>,
        astronaut: Astronaut,
    ) -> Result<Astronaut, AstronautError>;

    /// Records ordered by name.
    async fn list(
        &self,
        caller: Option<&User>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Astronaut>, AstronautError>;

    async fn get(&self, caller: Option<&User>, id: i32) -> Result<Astronaut, AstronautError>;

    /// Merges the scalar fields of `patch` into the stored record. Admin only.
    async fn update(
        &self,
        caller: Option<&User>,
        id: i32,
        patch: AstronautUpdate,
    ) -> Result<Astronaut, AstronautError>;

    /// Admin only.
    async fn delete(&self, caller: Option<&User>, id: i32) -> Result<(), AstronautError>;
}
