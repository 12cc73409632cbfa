//! Store-backed implementation of the `UserService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::UserStore;
use crate::models::{NewUser, Role, User, UserUpdate};
use crate::services::credentials::{generate_api_key, hash_password};
use crate::services::merge::{USER_UPDATE_FIELDS, UserPatch, merge};
use crate::services::user_service::{UserError, UserService};
use crate::services::with_deadline;
use crate::validation::{self, Check, Rules, Validator};

const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;

pub struct DefaultUserService {
    store: Arc<dyn UserStore>,
    validator: Validator,
    security: SecurityConfig,
    timeout: Duration,
}

impl DefaultUserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, security: SecurityConfig, timeout: Duration) -> Self {
        let rules = Rules::new()
            .with("require", validation::required)
            .with("length", validation::length(NAME_MAX))
            .with("email_length", validation::length(EMAIL_MAX))
            .with("email", validation::email)
            .with("password", validation::password(PASSWORD_MIN))
            .with("role", validation::role);

        Self {
            store,
            validator: Validator::new(rules),
            security,
            timeout,
        }
    }

    fn check(&self, checks: &[Check<'_>]) -> Result<(), UserError> {
        let errors = self.validator.validate(checks);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(UserError::Validation(errors))
        }
    }

    async fn hash(&self, password: &str) -> Result<String, UserError> {
        let password = password.to_string();
        let security = self.security.clone();

        let hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task failed: {e}")))??;

        Ok(hash)
    }

    async fn fetch(&self, id: i32) -> Result<User, UserError> {
        with_deadline(self.timeout, self.store.get(id))
            .await?
            .ok_or(UserError::NotFound)
    }
}

// ============================================================================
// Access gates
// ============================================================================

fn authenticated(caller: Option<&User>) -> Result<&User, UserError> {
    caller.ok_or(UserError::Unauthorized)
}

fn admin_only(caller: Option<&User>) -> Result<&User, UserError> {
    let caller = authenticated(caller)?;
    if caller.is_admin() {
        return Ok(caller);
    }
    warn!(caller_id = caller.id, "Rejected non-admin user listing");
    Err(UserError::Unauthorized)
}

fn self_or_admin(caller: Option<&User>, id: i32) -> Result<&User, UserError> {
    let caller = authenticated(caller)?;
    if caller.id == id || caller.is_admin() {
        return Ok(caller);
    }
    warn!(caller_id = caller.id, target_id = id, "Rejected access to another user");
    Err(UserError::Unauthorized)
}

fn self_only(caller: Option<&User>, id: i32) -> Result<&User, UserError> {
    let caller = authenticated(caller)?;
    if caller.id == id {
        return Ok(caller);
    }
    warn!(caller_id = caller.id, target_id = id, "Rejected credential change for another user");
    Err(UserError::Unauthorized)
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl UserService for DefaultUserService {
    async fn create(&self, _caller: Option<&User>, new_user: NewUser) -> Result<User, UserError> {
        self.check(&[
            Check::new("firstName", &new_user.first_name, &["require", "length"]),
            Check::new("surname", &new_user.surname, &["require", "length"]),
            Check::new(
                "email",
                &new_user.email,
                &["require", "email", "email_length"],
            ),
            Check::new("password", &new_user.password, &["require", "password"]),
        ])?;

        let role = Role::requested(new_user.role.as_deref());
        let password = self.hash(&new_user.password).await?;
        let now = Utc::now();

        let mut user = User {
            id: 0,
            first_name: new_user.first_name,
            surname: new_user.surname,
            email: new_user.email,
            password,
            api_key: generate_api_key(),
            role,
            created_at: now,
            updated_at: now,
        };

        user.id = with_deadline(self.timeout, self.store.create(&user)).await?;

        info!(user_id = user.id, role = %user.role, "User created");
        Ok(user.redacted())
    }

    async fn list(
        &self,
        caller: Option<&User>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>, UserError> {
        admin_only(caller)?;

        let users = with_deadline(self.timeout, self.store.list(limit, offset)).await?;
        Ok(users.into_iter().map(User::redacted).collect())
    }

    async fn get(&self, caller: Option<&User>, id: i32) -> Result<User, UserError> {
        let caller = self_or_admin(caller, id)?;

        if caller.id == id {
            return Ok(caller.clone().redacted());
        }

        Ok(self.fetch(id).await?.redacted())
    }

    async fn update(
        &self,
        caller: Option<&User>,
        id: i32,
        patch: UserUpdate,
    ) -> Result<User, UserError> {
        let caller = self_or_admin(caller, id)?;

        let mut checks = Vec::new();
        if let Some(first_name) = present(patch.first_name.as_ref()) {
            checks.push(Check::new("firstName", first_name, &["length"]));
        }
        if let Some(surname) = present(patch.surname.as_ref()) {
            checks.push(Check::new("surname", surname, &["length"]));
        }
        if let Some(email) = present(patch.email.as_ref()) {
            checks.push(Check::new("email", email, &["email", "email_length"]));
        }
        if let Some(role) = present(patch.role.as_ref()) {
            checks.push(Check::new("role", role, &["role"]));
        }
        self.check(&checks)?;

        let role = present(patch.role.as_ref()).and_then(|raw| raw.parse::<Role>().ok());
        if role.is_some_and(|role| role != caller.role) && !caller.is_admin() {
            warn!(caller_id = caller.id, target_id = id, "Rejected role change by non-admin");
            return Err(UserError::Unauthorized);
        }

        let mut user = if caller.id == id {
            caller.clone()
        } else {
            self.fetch(id).await?
        };

        let changed = merge(&mut user, &UserPatch::new(patch, role), USER_UPDATE_FIELDS);
        user.updated_at = Utc::now();

        with_deadline(self.timeout, self.store.update(&user)).await?;

        info!(user_id = id, caller_id = caller.id, ?changed, "User updated");
        Ok(user.redacted())
    }

    async fn delete(&self, caller: Option<&User>, id: i32) -> Result<(), UserError> {
        let caller = self_or_admin(caller, id)?;

        if !with_deadline(self.timeout, self.store.delete(id)).await? {
            return Err(UserError::NotFound);
        }

        info!(user_id = id, caller_id = caller.id, "User deleted");
        Ok(())
    }

    async fn reset_password(
        &self,
        caller: Option<&User>,
        id: i32,
        password: &str,
    ) -> Result<(), UserError> {
        let caller = self_only(caller, id)?;

        self.check(&[Check::new("password", password, &["require", "password"])])?;

        let mut user = caller.clone();
        user.password = self.hash(password).await?;
        user.updated_at = Utc::now();

        with_deadline(self.timeout, self.store.update_password(&user)).await?;

        info!(user_id = id, "Password reset");
        Ok(())
    }

    async fn generate_new_api_key(
        &self,
        caller: Option<&User>,
        id: i32,
    ) -> Result<User, UserError> {
        let caller = self_only(caller, id)?;

        let mut user = caller.clone();
        user.api_key = generate_api_key();
        user.updated_at = Utc::now();

        with_deadline(self.timeout, self.store.update_api_key(&user)).await?;

        info!(user_id = id, "API key rotated");
        Ok(user.redacted())
    }

    async fn search_api_key(&self, key: &str) -> Result<Option<User>, UserError> {
        Ok(with_deadline(self.timeout, self.store.search_by_api_key(key)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryUserStore;
    use crate::services::credentials::verify_password;

    const PASSWORD: &str = "Abc123!.";

    fn cheap() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    fn service_with(store: Arc<MemoryUserStore>) -> DefaultUserService {
        DefaultUserService::new(store, cheap(), Duration::from_secs(5))
    }

    fn new_user(first: &str, surname: &str, email: &str, role: Option<&str>) -> NewUser {
        NewUser {
            first_name: first.to_string(),
            surname: surname.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role: role.map(str::to_string),
        }
    }

    /// Returns the created user with its stored hash, as the auth layer
    /// would resolve it.
    async fn register(
        service: &DefaultUserService,
        store: &MemoryUserStore,
        user: NewUser,
    ) -> User {
        let created = service.create(None, user).await.unwrap();
        store.get(created.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = service
            .create(None, new_user("Ada", "Lovelace", "ada@x.com", None))
            .await
            .unwrap();

        assert!(ada.id > 0);
        assert_eq!(ada.role, Role::User);
        assert_eq!(ada.api_key.len(), 64);
        assert!(ada.password.is_empty());
        assert_eq!(ada.created_at, ada.updated_at);

        let stored = store.get(ada.id).await.unwrap().unwrap();
        assert!(stored.password.starts_with("$argon2id$"));
        assert!(verify_password(PASSWORD, &stored.password).unwrap());
        assert_eq!(stored.api_key, ada.api_key);
    }

    #[tokio::test]
    async fn test_create_role_is_admin_only_when_exactly_requested() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let cases = [
            (Some("admin"), Role::Admin),
            (Some("Admin"), Role::User),
            (Some("root"), Role::User),
            (Some(""), Role::User),
            (None, Role::User),
        ];

        for (i, (requested, expected)) in cases.into_iter().enumerate() {
            let email = format!("user{i}@x.com");
            let user = service
                .create(None, new_user("Test", "User", &email, requested))
                .await
                .unwrap();
            assert_eq!(user.role, expected, "requested {requested:?}");
        }
    }

    #[tokio::test]
    async fn test_create_validation_runs_before_store() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let err = service
            .create(
                None,
                NewUser {
                    email: "not-an-email".to_string(),
                    password: "password".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        let UserError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.iter().any(|e| e.starts_with("firstName")));
        assert!(errors.iter().any(|e| e.starts_with("surname")));
        assert!(errors.iter().any(|e| e.starts_with("email")));
        assert_eq!(errors.iter().filter(|e| e.starts_with("password")).count(), 3);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        service
            .create(None, new_user("Ada", "Lovelace", "ada@x.com", None))
            .await
            .unwrap();
        let err = service
            .create(None, new_user("Ada", "Byron", "ada@x.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_self_or_admin_gates() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;
        let alan = register(&service, &store, new_user("Alan", "Turing", "alan@x.com", None)).await;
        let root =
            register(&service, &store, new_user("Grace", "Hopper", "gh@x.com", Some("admin"))).await;

        // self, without a store round trip
        let calls = store.calls();
        let me = service.get(Some(&ada), ada.id).await.unwrap();
        assert_eq!(me.id, ada.id);
        assert!(me.password.is_empty());
        assert_eq!(store.calls(), calls);

        assert!(matches!(
            service.get(Some(&ada), alan.id).await,
            Err(UserError::Unauthorized)
        ));
        assert!(matches!(
            service.get(None, alan.id).await,
            Err(UserError::Unauthorized)
        ));
        assert_eq!(service.get(Some(&root), alan.id).await.unwrap().id, alan.id);
        assert!(matches!(
            service.get(Some(&root), 999).await,
            Err(UserError::NotFound)
        ));

        assert!(matches!(
            service.delete(Some(&ada), alan.id).await,
            Err(UserError::Unauthorized)
        ));
        service.delete(Some(&ada), ada.id).await.unwrap();
        service.delete(Some(&root), alan.id).await.unwrap();
        assert!(matches!(
            service.delete(Some(&root), alan.id).await,
            Err(UserError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_is_admin_only() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;
        let root =
            register(&service, &store, new_user("Grace", "Hopper", "gh@x.com", Some("admin"))).await;

        assert!(matches!(
            service.list(Some(&ada), 10, 0).await,
            Err(UserError::Unauthorized)
        ));

        let users = service.list(Some(&root), 10, 0).await.unwrap();
        let surnames: Vec<_> = users.iter().map(|u| u.surname.as_str()).collect();
        assert_eq!(surnames, vec!["Hopper", "Lovelace"]);
        assert!(users.iter().all(|u| u.password.is_empty()));
    }

    #[tokio::test]
    async fn test_update_merges_present_fields_only() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;

        let patch = UserUpdate {
            first_name: Some(String::new()),
            surname: Some("King".to_string()),
            ..Default::default()
        };
        let updated = service.update(Some(&ada), ada.id, patch.clone()).await.unwrap();
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.surname, "King");
        assert_eq!(updated.email, "ada@x.com");
        assert!(updated.password.is_empty());

        let stored = store.get(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.surname, "King");
        assert_eq!(stored.password, ada.password);
        assert_eq!(stored.api_key, ada.api_key);

        let again = service.update(Some(&stored), ada.id, patch).await.unwrap();
        assert_eq!(again.first_name, updated.first_name);
        assert_eq!(again.surname, updated.surname);
        assert_eq!(again.email, updated.email);
        assert_eq!(again.role, updated.role);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_fields() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;
        let calls = store.calls();

        let err = service
            .update(
                Some(&ada),
                ada.id,
                UserUpdate {
                    email: Some("nope".to_string()),
                    role: Some("root".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        let UserError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn test_admin_updates_other_user() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;
        let root =
            register(&service, &store, new_user("Grace", "Hopper", "gh@x.com", Some("admin"))).await;

        let updated = service
            .update(
                Some(&root),
                ada.id,
                UserUpdate {
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);

        assert!(matches!(
            service.update(Some(&root), 999, UserUpdate::default()).await,
            Err(UserError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_change_own_role() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;
        let calls = store.calls();

        let promote = UserUpdate {
            first_name: Some("Augusta".to_string()),
            role: Some("admin".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(Some(&ada), ada.id, promote).await,
            Err(UserError::Unauthorized)
        ));
        assert_eq!(store.calls(), calls);

        let stored = store.get(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
        assert_eq!(stored.first_name, "Ada");

        // Restating the current role is not a change.
        let same = UserUpdate {
            first_name: Some("Augusta".to_string()),
            role: Some("user".to_string()),
            ..Default::default()
        };
        let updated = service.update(Some(&ada), ada.id, same).await.unwrap();
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.first_name, "Augusta");
    }

    #[tokio::test]
    async fn test_reset_password_for_other_user_never_touches_store() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let now = Utc::now();
        let caller = User {
            id: 5,
            first_name: "Eve".to_string(),
            surname: "Admin".to_string(),
            email: "eve@x.com".to_string(),
            password: String::new(),
            api_key: generate_api_key(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };

        let err = service
            .reset_password(Some(&caller), 7, PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Unauthorized));

        let err = service.generate_new_api_key(Some(&caller), 7).await.unwrap_err();
        assert!(matches!(err, UserError::Unauthorized));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_reset_password_rehashes() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;

        let err = service
            .reset_password(Some(&ada), ada.id, "weak")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));

        service
            .reset_password(Some(&ada), ada.id, "Xyz789?!")
            .await
            .unwrap();

        let stored = store.get(ada.id).await.unwrap().unwrap();
        assert!(verify_password("Xyz789?!", &stored.password).unwrap());
        assert!(!verify_password(PASSWORD, &stored.password).unwrap());
        assert!(stored.updated_at >= ada.updated_at);
    }

    #[tokio::test]
    async fn test_api_key_rotation() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(Arc::clone(&store));

        let ada = register(&service, &store, new_user("Ada", "Lovelace", "ada@x.com", None)).await;

        let rotated = service.generate_new_api_key(Some(&ada), ada.id).await.unwrap();
        assert_ne!(rotated.api_key, ada.api_key);
        assert!(rotated.password.is_empty());

        assert!(service.search_api_key(&ada.api_key).await.unwrap().is_none());
        let found = service.search_api_key(&rotated.api_key).await.unwrap().unwrap();
        assert_eq!(found.id, ada.id);
    }

    #[tokio::test]
    async fn test_store_deadline() {
        let store = Arc::new(MemoryUserStore::with_latency(Duration::from_millis(200)));
        let service = DefaultUserService::new(store, cheap(), Duration::from_millis(20));

        let err = service.search_api_key("abc").await.unwrap_err();
        assert!(matches!(err, UserError::Timeout));
    }
}
