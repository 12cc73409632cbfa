//! Maps a presented API key to the account that owns it.

use std::sync::Arc;
use tracing::debug;

use crate::models::User;
use crate::services::credentials::is_well_formed_api_key;
use crate::services::user_service::{UserError, UserService};

#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserService>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(users: Arc<dyn UserService>) -> Self {
        Self { users }
    }

    /// Resolves `key` to a user.
    ///
    /// # Errors
    ///
    /// Missing, malformed and unknown keys all yield
    /// [`UserError::Unauthorized`]. Store failures pass through.
    pub async fn resolve(&self, key: Option<&str>) -> Result<User, UserError> {
        let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            debug!("No API key presented");
            return Err(UserError::Unauthorized);
        };

        if !is_well_formed_api_key(key) {
            debug!("Malformed API key presented");
            return Err(UserError::Unauthorized);
        }

        self.users
            .search_api_key(key)
            .await?
            .ok_or(UserError::Unauthorized)
    }
}
