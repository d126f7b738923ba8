//! Shared test helpers: in-memory SQLite store, stub external source, a store
//! wrapper that injects failures and an overlapping in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_rs::db::{RegionalStore, RegionalUnitOfWork, SqliteRegionalStore, StoreError};
use catalog_rs::models::{ExternalId, ExternalRegionalRecord, Regional};
use catalog_rs::services::{ExternalFetchError, RegionalSource};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fresh in-memory catalog database
///
/// One connection: every connection to `sqlite::memory:` is its own database.
pub async fn setup_store() -> SqliteRegionalStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    catalog_common::db::create_schema(&pool)
        .await
        .expect("Should create schema");
    SqliteRegionalStore::new(pool)
}

/// Store rows directly, bypassing the sync engine
pub async fn seed(store: &SqliteRegionalStore, regionals: Vec<Regional>) -> Vec<Regional> {
    let mut uow = store.begin().await.unwrap();
    let saved = uow.save_all(regionals).await.unwrap();
    uow.commit().await.unwrap();
    saved
}

pub fn active(external_id: Option<ExternalId>, name: &str) -> Regional {
    Regional::new(external_id, name)
}

pub fn external(entries: &[(ExternalId, &str)]) -> Vec<ExternalRegionalRecord> {
    entries
        .iter()
        .map(|(id, name)| ExternalRegionalRecord::new(*id, *name))
        .collect()
}

pub async fn active_rows(store: &SqliteRegionalStore) -> Vec<Regional> {
    store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.active)
        .collect()
}

/// Panics if any external id has more than one active row
pub async fn assert_at_most_one_active(store: &SqliteRegionalStore) {
    let mut counts: HashMap<ExternalId, usize> = HashMap::new();
    for regional in active_rows(store).await {
        if let Some(external_id) = regional.external_id {
            *counts.entry(external_id).or_default() += 1;
        }
    }
    for (external_id, count) in counts {
        assert!(
            count <= 1,
            "external id {} has {} active rows",
            external_id,
            count
        );
    }
}

/// External source returning a configurable snapshot
#[derive(Default)]
pub struct StubSource {
    records: Mutex<Vec<ExternalRegionalRecord>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new(records: Vec<ExternalRegionalRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let source = Self::default();
        source.set_failing(true);
        source
    }

    pub fn set_records(&self, records: Vec<ExternalRegionalRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionalSource for StubSource {
    async fn fetch_all(&self) -> Result<Vec<ExternalRegionalRecord>, ExternalFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExternalFetchError::Network("stub source unavailable".to_string()));
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

/// Wraps a store, counting units of work and optionally failing the Nth save
pub struct ProbeStore {
    inner: SqliteRegionalStore,
    fail_on_save: Option<usize>,
    begins: AtomicUsize,
}

impl ProbeStore {
    pub fn new(inner: SqliteRegionalStore) -> Self {
        Self {
            inner,
            fail_on_save: None,
            begins: AtomicUsize::new(0),
        }
    }

    /// Fail the save with this zero-based index within each unit of work
    pub fn failing_on_save(inner: SqliteRegionalStore, index: usize) -> Self {
        Self {
            fail_on_save: Some(index),
            ..Self::new(inner)
        }
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionalStore for ProbeStore {
    async fn begin(&self) -> Result<Box<dyn RegionalUnitOfWork>, StoreError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin().await?;
        Ok(Box::new(ProbeUnitOfWork {
            inner,
            fail_on_save: self.fail_on_save,
            saves: 0,
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Regional>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Regional>, StoreError> {
        self.inner.list_active(limit, offset).await
    }

    async fn count_active(&self) -> Result<i64, StoreError> {
        self.inner.count_active().await
    }
}

struct ProbeUnitOfWork {
    inner: Box<dyn RegionalUnitOfWork>,
    fail_on_save: Option<usize>,
    saves: usize,
}

#[async_trait]
impl RegionalUnitOfWork for ProbeUnitOfWork {
    async fn find_active(&mut self) -> Result<Vec<Regional>, StoreError> {
        self.inner.find_active().await
    }

    async fn save(&mut self, regional: Regional) -> Result<Regional, StoreError> {
        let index = self.saves;
        self.saves += 1;
        if self.fail_on_save == Some(index) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            )));
        }
        self.inner.save(regional).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}

/// Read-committed in-memory store that lets units of work overlap
///
/// Each unit of work reads the committed rows, buffers its writes and applies
/// them on commit. An optional delay after the active-set read gives a
/// concurrent run time to open its own unit of work.
#[derive(Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<Regional>>>,
    read_delay: Duration,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn with_read_delay(read_delay: Duration) -> Self {
        Self {
            read_delay,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<Regional> {
        self.rows.lock().unwrap().clone()
    }

    pub fn active_for(&self, external_id: ExternalId) -> usize {
        self.rows()
            .iter()
            .filter(|r| r.active && r.external_id == Some(external_id))
            .count()
    }

    /// Highest number of units of work that were open at the same time
    pub fn max_concurrent_units(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionalStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn RegionalUnitOfWork>, StoreError> {
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MemoryUnitOfWork {
            rows: Arc::clone(&self.rows),
            open: Arc::clone(&self.open),
            read_delay: self.read_delay,
            inserts: Vec::new(),
            updates: Vec::new(),
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Regional>, StoreError> {
        Ok(self.rows().into_iter().find(|r| r.id == Some(id)))
    }

    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Regional>, StoreError> {
        Ok(self
            .rows()
            .into_iter()
            .filter(|r| r.active)
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_active(&self) -> Result<i64, StoreError> {
        Ok(self.rows().iter().filter(|r| r.active).count() as i64)
    }
}

struct MemoryUnitOfWork {
    rows: Arc<Mutex<Vec<Regional>>>,
    open: Arc<AtomicUsize>,
    read_delay: Duration,
    inserts: Vec<Regional>,
    updates: Vec<(i64, bool)>,
}

#[async_trait]
impl RegionalUnitOfWork for MemoryUnitOfWork {
    async fn find_active(&mut self) -> Result<Vec<Regional>, StoreError> {
        let active: Vec<Regional> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.active)
            .cloned()
            .collect();
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        Ok(active)
    }

    async fn save(&mut self, regional: Regional) -> Result<Regional, StoreError> {
        match regional.id {
            None => self.inserts.push(regional.clone()),
            Some(id) => self.updates.push((id, regional.active)),
        }
        Ok(regional)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        let committed = Arc::clone(&this.rows);
        let mut rows = committed.lock().unwrap();
        for (id, active) in this.updates.drain(..) {
            match rows.iter_mut().find(|r| r.id == Some(id)) {
                Some(row) => row.active = active,
                None => return Err(StoreError::NotFound(id)),
            }
        }
        for mut regional in this.inserts.drain(..) {
            regional.id = Some(rows.len() as i64 + 1);
            rows.push(regional);
        }
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
