use std::future::Future;
use std::time::Duration;

use crate::db::{StoreError, StoreResult};

pub mod credentials;
pub mod merge;

pub mod identity;
pub use identity::IdentityResolver;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::DefaultUserService;

pub mod astronaut_service;
pub mod astronaut_service_impl;
pub use astronaut_service::{AstronautError, AstronautService};
pub use astronaut_service_impl::DefaultAstronautService;

/// Runs a store call under `deadline`. Expiry drops the in-flight future.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}
