use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AstronautService, DefaultAstronautService, DefaultUserService, IdentityResolver, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub astronaut_service: Arc<dyn AstronautService>,

    pub identity: IdentityResolver,
}

impl SharedState {
    /// Opens the database, applies migrations and wires the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let timeout = config.store.timeout();

        let user_service: Arc<dyn UserService> = Arc::new(DefaultUserService::new(
            store.users(),
            config.security.clone(),
            timeout,
        ));

        let astronaut_service: Arc<dyn AstronautService> =
            Arc::new(DefaultAstronautService::new(store.astronauts(), timeout));

        let identity = IdentityResolver::new(Arc::clone(&user_service));

        Self {
            config: Arc::new(config),
            store,
            user_service,
            astronaut_service,
            identity,
        }
    }
}
