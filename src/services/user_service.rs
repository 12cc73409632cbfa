//! Domain service for user accounts.
//!
//! Every operation takes the resolved caller explicitly. Access rules:
//! registration is open, listing is admin-only, get/update/delete admit the
//! account itself or an admin, and password reset and key rotation are
//! self-only.

use thiserror::Error;

use crate::db::StoreError;
use crate::models::{NewUser, User, UserUpdate};

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not authorized")]
    Unauthorized,

    #[error("User not found")]
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

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(detail) => Self::Conflict(detail),
            StoreError::Timeout => Self::Timeout,
            StoreError::Database(detail) => Self::Database(detail),
        }
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for user accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Registers a user. The returned record carries the generated id and
    /// API key and an empty password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] with every failed check, or
    /// [`UserError::Conflict`] when the email is taken.
    async fn create(&self, caller: Option<&User>, new_user: NewUser) -> Result<User, UserError>;

    /// Lists users ordered by surname. Admin only.
    async fn list(
        &self,
        caller: Option<&User>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>, UserError>;

    /// Fetches one user. Self or admin.
    async fn get(&self, caller: Option<&User>, id: i32) -> Result<User, UserError>;

    /// Merges `patch` into the stored user. Self or admin.
    async fn update(
        &self,
        caller: Option<&User>,
        id: i32,
        patch: UserUpdate,
    ) -> Result<User, UserError>;

    /// Deletes a user. Self or admin.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] when no row was removed.
    async fn delete(&self, caller: Option<&User>, id: i32) -> Result<(), UserError>;

    /// Replaces the caller's password. Self only.
    async fn reset_password(
        &self,
        caller: Option<&User>,
        id: i32,
        password: &str,
    ) -> Result<(), UserError>;

    /// Issues a fresh API key for the caller. Self only.
    async fn generate_new_api_key(&self, caller: Option<&User>, id: i32)
    -> Result<User, UserError>;

    /// Looks up the account owning `key`. Used by the authentication layer.
    async fn search_api_key(&self, key: &str) -> Result<Option<User>, UserError>;
}
