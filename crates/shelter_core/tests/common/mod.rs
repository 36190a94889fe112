#![allow(dead_code)]

use shelter_core::db::DbError;
use shelter_core::{
    AnimalShelter, Bson, Document, DocumentStore, SqliteStore, StoreError, StoreResult,
    UpdateOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory store that counts every call reaching it.
pub struct CountingStore {
    inner: SqliteStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Self {
            inner: SqliteStore::open_in_memory("animals").unwrap(),
            calls: Arc::clone(&calls),
        };
        (store, calls)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for CountingStore {
    fn ping(&self) -> StoreResult<()> {
        self.hit();
        self.inner.ping()
    }

    fn insert_one(&self, record: Document) -> StoreResult<Bson> {
        self.hit();
        self.inner.insert_one(record)
    }

    fn insert_many(&self, records: Vec<Document>) -> StoreResult<Vec<Bson>> {
        self.hit();
        self.inner.insert_many(records)
    }

    fn find(&self, filter: Document, projection: Option<Document>) -> StoreResult<Vec<Document>> {
        self.hit();
        self.inner.find(filter, projection)
    }

    fn update_many(&self, filter: Document, fields: Document) -> StoreResult<UpdateOutcome> {
        self.hit();
        self.inner.update_many(filter, fields)
    }

    fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        self.hit();
        self.inner.delete_many(filter)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Store whose liveness check passes or fails on demand and whose data
/// operations always fail.
pub struct FailingStore {
    ping_ok: bool,
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn rejecting_auth() -> (Self, Arc<AtomicUsize>) {
        Self::build(false)
    }

    pub fn broken_after_connect() -> (Self, Arc<AtomicUsize>) {
        Self::build(true)
    }

    fn build(ping_ok: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Self {
            ping_ok,
            calls: Arc::clone(&calls),
        };
        (store, calls)
    }

    fn fail<T>(&self) -> StoreResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(auth_failure())
    }
}

impl DocumentStore for FailingStore {
    fn ping(&self) -> StoreResult<()> {
        if self.ping_ok {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
        self.fail()
    }

    fn insert_one(&self, _record: Document) -> StoreResult<Bson> {
        self.fail()
    }

    fn insert_many(&self, _records: Vec<Document>) -> StoreResult<Vec<Bson>> {
        self.fail()
    }

    fn find(&self, _filter: Document, _projection: Option<Document>) -> StoreResult<Vec<Document>> {
        self.fail()
    }

    fn update_many(&self, _filter: Document, _fields: Document) -> StoreResult<UpdateOutcome> {
        self.fail()
    }

    fn delete_many(&self, _filter: Document) -> StoreResult<u64> {
        self.fail()
    }

    fn describe(&self) -> String {
        "failing.animals".to_string()
    }
}

pub fn auth_failure() -> StoreError {
    StoreError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_AUTH),
        Some("authentication failed".to_string()),
    )))
}

pub fn in_memory_shelter() -> AnimalShelter<SqliteStore> {
    AnimalShelter::with_store(SqliteStore::open_in_memory("animals").unwrap())
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
