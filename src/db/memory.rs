//! In-memory record stores.
//!
//! Used as test doubles for the services. Each store counts the calls it
//! receives and can be given an artificial latency per call.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::db::{AstronautStore, StoreError, StoreResult, UserStore};
use crate::models::{Astronaut, User};

struct Table<T> {
    next_id: i32,
    rows: BTreeMap<i32, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Probe {
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl Probe {
    async fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: Mutex<Table<User>>,
    probe: Probe,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before touching the table.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            probe: Probe {
                latency: Some(latency),
                ..Probe::default()
            },
            ..Self::default()
        }
    }

    /// Number of store calls received so far.
    pub fn calls(&self) -> usize {
        self.probe.calls.load(Ordering::SeqCst)
    }

    fn check_unique(rows: &BTreeMap<i32, User>, user: &User) -> StoreResult<()> {
        for other in rows.values().filter(|u| u.id != user.id) {
            if other.email == user.email {
                return Err(StoreError::Conflict("users.email".to_string()));
            }
            if other.api_key == user.api_key {
                return Err(StoreError::Conflict("users.api_key".to_string()));
            }
        }
        Ok(())
    }

    async fn modify<F>(&self, id: i32, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut User) + Send,
    {
        self.probe.hit().await;
        let mut table = self.table.lock().await;
        let row = table.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply(row);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> StoreResult<i32> {
        self.probe.hit().await;
        let mut table = self.table.lock().await;
        Self::check_unique(&table.rows, user)?;

        let id = table.allocate();
        let mut row = user.clone();
        row.id = id;
        table.rows.insert(id, row);
        Ok(id)
    }

    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<User>> {
        self.probe.hit().await;
        let table = self.table.lock().await;

        let mut users: Vec<User> = table.rows.values().cloned().collect();
        users.sort_by(|a, b| a.surname.cmp(&b.surname).then(a.id.cmp(&b.id)));

        Ok(page(users, limit, offset))
    }

    async fn get(&self, id: i32) -> StoreResult<Option<User>> {
        self.probe.hit().await;
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        self.probe.hit().await;
        let mut table = self.table.lock().await;
        Self::check_unique(&table.rows, user)?;

        let row = table.rows.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        row.first_name.clone_from(&user.first_name);
        row.surname.clone_from(&user.surname);
        row.email.clone_from(&user.email);
        row.role = user.role;
        row.updated_at = user.updated_at;
        Ok(())
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        self.probe.hit().await;
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }

    async fn search_by_api_key(&self, key: &str) -> StoreResult<Option<User>> {
        self.probe.hit().await;
        let table = self.table.lock().await;
        Ok(table.rows.values().find(|u| u.api_key == key).cloned())
    }

    async fn update_password(&self, user: &User) -> StoreResult<()> {
        let (password, updated_at) = (user.password.clone(), user.updated_at);
        self.modify(user.id, move |row| {
            row.password = password;
            row.updated_at = updated_at;
        })
        .await
    }

    async fn update_api_key(&self, user: &User) -> StoreResult<()> {
        let (api_key, updated_at) = (user.api_key.clone(), user.updated_at);
        self.modify(user.id, move |row| {
            row.api_key = api_key;
            row.updated_at = updated_at;
        })
        .await
    }
}

#[derive(Default)]
pub struct MemoryAstronautStore {
    table: Mutex<Table<Astronaut>>,
    probe: Probe,
}

impl MemoryAstronautStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            probe: Probe {
                latency: Some(latency),
                ..Probe::default()
            },
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.probe.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AstronautStore for MemoryAstronautStore {
    async fn create(&self, astronaut: &Astronaut) -> StoreResult<i32> {
        self.probe.hit().await;
        let mut table = self.table.lock().await;

        let id = table.allocate();
        let mut row = astronaut.clone();
        row.id = id;
        table.rows.insert(id, row);
        Ok(id)
    }

    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<Astronaut>> {
        self.probe.hit().await;
        let table = self.table.lock().await;

        let mut astronauts: Vec<Astronaut> = table.rows.values().cloned().collect();
        astronauts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(page(astronauts, limit, offset))
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Astronaut>> {
        self.probe.hit().await;
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn update(&self, astronaut: &Astronaut) -> StoreResult<()> {
        self.probe.hit().await;
        let mut table = self.table.lock().await;
        let row = table
            .rows
            .get_mut(&astronaut.id)
            .ok_or(StoreError::NotFound)?;
        *row = astronaut.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        self.probe.hit().await;
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }
}

fn page<T>(rows: Vec<T>, limit: u64, offset: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}
