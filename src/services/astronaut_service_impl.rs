//! Store-backed implementation of the `AstronautService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::AstronautStore;
use crate::models::{Astronaut, AstronautUpdate, User};
use crate::services::astronaut_service::{AstronautError, AstronautService};
use crate::services::merge::{ASTRONAUT_UPDATE_FIELDS, merge};
use crate::services::with_deadline;
use crate::validation::{self, Check, Rules, Validator};

pub struct DefaultAstronautService {
    store: Arc<dyn AstronautStore>,
    validator: Validator,
    timeout: Duration,
}

impl DefaultAstronautService {
    #[must_use]
    pub fn new(store: Arc<dyn AstronautStore>, timeout: Duration) -> Self {
        let rules = Rules::new()
            .with("require", validation::required)
            .with("status", validation::status)
            .with("date", validation::date)
            .with("gender", validation::gender);

        Self {
            store,
            validator: Validator::new(rules),
            timeout,
        }
    }

    fn check(&self, checks: &[Check<'_>]) -> Result<(), AstronautError> {
        let errors = self.validator.validate(checks);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AstronautError::Validation(errors))
        }
    }

    async fn fetch(&self, id: i32) -> Result<Astronaut, AstronautError> {
        with_deadline(self.timeout, self.store.get(id))
            .await?
            .ok_or(AstronautError::NotFound)
    }
}

fn authenticated(caller: Option<&User>) -> Result<&User, AstronautError> {
    caller.ok_or(AstronautError::Unauthorized)
}

fn admin_only<'a>(caller: Option<&'a User>, action: &str) -> Result<&'a User, AstronautError> {
    let caller = authenticated(caller)?;
    if caller.is_admin() {
        return Ok(caller);
    }
    warn!(caller_id = caller.id, action, "Rejected non-admin astronaut mutation");
    Err(AstronautError::Unauthorized)
}

#[async_trait]
impl AstronautService for DefaultAstronautService {
    async fn create(
        &self,
        caller: Option<&User>,
        mut astronaut: Astronaut,
    ) -> Result<Astronaut, AstronautError> {
        let caller = admin_only(caller, "create")?;

        self.check(&[
            Check::new("name", &astronaut.name, &["require"]),
            Check::new("status", &astronaut.status, &["status"]),
            Check::new("birthDate", &astronaut.birth_date, &["date"]),
            Check::new("birthPlace", &astronaut.birth_place, &["require"]),
            Check::new("gender", &astronaut.gender, &["gender"]),
        ])?;

        astronaut.normalize();
        astronaut.id = with_deadline(self.timeout, self.store.create(&astronaut)).await?;

        info!(astronaut_id = astronaut.id, caller_id = caller.id, "Astronaut created");
        Ok(astronaut)
    }

    async fn list(
        &self,
        caller: Option<&User>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Astronaut>, AstronautError> {
        authenticated(caller)?;
        Ok(with_deadline(self.timeout, self.store.list(limit, offset)).await?)
    }

    async fn get(&self, caller: Option<&User>, id: i32) -> Result<Astronaut, AstronautError> {
        authenticated(caller)?;
        self.fetch(id).await
    }

    async fn update(
        &self,
        caller: Option<&User>,
        id: i32,
        patch: AstronautUpdate,
    ) -> Result<Astronaut, AstronautError> {
        let caller = admin_only(caller, "update")?;

        let mut checks = Vec::new();
        if let Some(status) = patch.status.as_deref().filter(|s| !s.trim().is_empty()) {
            checks.push(Check::new("status", status, &["status"]));
        }
        if let Some(gender) = patch.gender.as_deref().filter(|g| !g.trim().is_empty()) {
            checks.push(Check::new("gender", gender, &["gender"]));
        }
        self.check(&checks)?;

        let mut astronaut = self.fetch(id).await?;
        let changed = merge(&mut astronaut, &patch, ASTRONAUT_UPDATE_FIELDS);

        with_deadline(self.timeout, self.store.update(&astronaut)).await?;

        info!(astronaut_id = id, caller_id = caller.id, ?changed, "Astronaut updated");
        Ok(astronaut)
    }

    async fn delete(&self, caller: Option<&User>, id: i32) -> Result<(), AstronautError> {
        let caller = admin_only(caller, "delete")?;

        if !with_deadline(self.timeout, self.store.delete(id)).await? {
            return Err(AstronautError::NotFound);
        }

        info!(astronaut_id = id, caller_id = caller.id, "Astronaut deleted");
        Ok(())
    }
}
