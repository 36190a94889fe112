//! Animal record facade over one document collection.
//!
//! # Responsibility
//! - Establish the store connection once and remember whether it worked.
//! - Validate argument shapes before any store I/O.
//! - Offer `try_*` operations with explicit errors, plus legacy operations
//!   that collapse every failure to `false`, `0` or an empty list.
//!
//! # Invariants
//! - A facade that failed to connect stays disabled for its whole lifetime
//!   and never touches the network again.
//! - Records passed to the store for insertion never carry a caller `_id`.
//! - Every failure is logged once, in the `try_*` path, before it returns.
//! - Facade state is immutable after construction; `AnimalShelter<S>` is
//!   `Send + Sync` whenever `S` is.

use crate::config::ConnectionConfig;
use crate::model::record::{
    optional_document, required_document, CreatePayload, InputError, Record,
};
use crate::store::{DocumentStore, MongoStore, StoreError, StoreResult, UpdateOutcome};
use bson::Bson;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ShelterResult<T> = Result<T, ShelterError>;

/// Why a facade operation produced no result.
#[derive(Debug)]
pub enum ShelterError {
    /// Construction failed; the facade is permanently disabled.
    Unavailable { reason: String },
    /// Caller argument has the wrong shape. Detected before any I/O.
    InvalidInput(InputError),
    /// The store call itself failed.
    Store(StoreError),
}

impl ShelterError {
    /// Stable `error_code` value used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "collection_unavailable",
            Self::InvalidInput(_) => "invalid_input",
            Self::Store(_) => "store_failure",
        }
    }
}

impl Display for ShelterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "no collection available (connection failed: {reason})")
            }
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ShelterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { .. } => None,
            Self::InvalidInput(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<InputError> for ShelterError {
    fn from(value: InputError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<StoreError> for ShelterError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

enum ShelterState<S> {
    Connected(S),
    Disabled { reason: String },
}

/// CRUD facade for the shelter's animal collection.
///
/// Construction never fails: an unreachable server or rejected credentials
/// yield a disabled facade whose operations all short-circuit.
pub struct AnimalShelter<S: DocumentStore = MongoStore> {
    state: ShelterState<S>,
}

impl AnimalShelter<MongoStore> {
    /// Connects with default host, port and databases.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::connect(&ConnectionConfig::new(username, password))
    }

    /// Connects to the server and collection named by `config`.
    pub fn connect(config: &ConnectionConfig) -> Self {
        Self::establish(|| MongoStore::connect(config))
    }
}

impl<S: DocumentStore> AnimalShelter<S> {
    /// Wraps an already-built store, running the same liveness check.
    pub fn with_store(store: S) -> Self {
        Self::establish(|| Ok(store))
    }

    /// Builds the store, pings it, and disables the facade on any failure.
    ///
    /// # Side effects
    /// - Emits `shelter_init` logging events with duration and status.
    pub fn establish(connect: impl FnOnce() -> StoreResult<S>) -> Self {
        let started_at = Instant::now();
        info!("event=shelter_init module=shelter status=start");

        let attempt = connect().and_then(|store| {
            store.ping()?;
            Ok(store)
        });

        match attempt {
            Ok(store) => {
                info!(
                    "event=shelter_init module=shelter status=ok duration_ms={} target={}",
                    started_at.elapsed().as_millis(),
                    store.describe()
                );
                Self {
                    state: ShelterState::Connected(store),
                }
            }
            Err(err) => {
                error!(
                    "event=shelter_init module=shelter status=error duration_ms={} error_code=store_unreachable error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Self::disabled(err.to_string())
            }
        }
    }

    /// Returns a facade that is disabled from the start.
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            state: ShelterState::Disabled {
                reason: reason.into(),
            },
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ShelterState::Connected(_))
    }

    /// Returns the construction failure when the facade is disabled.
    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.state {
            ShelterState::Connected(_) => None,
            ShelterState::Disabled { reason } => Some(reason),
        }
    }

    /// `database.collection` label of the bound collection, if connected.
    pub fn collection_name(&self) -> Option<String> {
        self.store().ok().map(|store| store.describe())
    }

    /// Inserts one record or a batch and returns the assigned identities.
    ///
    /// Accepts a document or an array of documents; any `_id` supplied by the
    /// caller is discarded. Arrays containing non-documents are rejected
    /// whole.
    pub fn try_create(&self, data: impl Into<Bson>) -> ShelterResult<Vec<Bson>> {
        let started_at = Instant::now();
        let result = self.store().and_then(|store| {
            let ids = match CreatePayload::from_bson(data.into())? {
                CreatePayload::One(record) => vec![store.insert_one(record)?],
                CreatePayload::Many(records) => store.insert_many(records)?,
            };
            Ok(ids)
        });
        log_outcome("create", started_at, &result, |ids| {
            format!("inserted={}", ids.len())
        });
        result
    }

    /// Returns every record matching `query`, optionally projected.
    ///
    /// `Bson::Null` for `query` means "match everything"; `Bson::Null` for
    /// `projection` means "all fields".
    pub fn try_read(
        &self,
        query: impl Into<Bson>,
        projection: impl Into<Bson>,
    ) -> ShelterResult<Vec<Record>> {
        let started_at = Instant::now();
        let result = self.store().and_then(|store| {
            let filter = optional_document(query.into(), "query")?.unwrap_or_default();
            let projection = optional_document(projection.into(), "projection")?;
            Ok(store.find(filter, projection)?)
        });
        log_outcome("read", started_at, &result, |records| {
            format!("returned={}", records.len())
        });
        result
    }

    /// Sets `new_values` on every record matching `query`.
    pub fn try_update(
        &self,
        query: impl Into<Bson>,
        new_values: impl Into<Bson>,
    ) -> ShelterResult<UpdateOutcome> {
        let started_at = Instant::now();
        let result = self.store().and_then(|store| {
            let filter = required_document(query.into(), "query")?;
            let fields = required_document(new_values.into(), "update values")?;
            Ok(store.update_many(filter, fields)?)
        });
        log_outcome("update", started_at, &result, |outcome| {
            format!("matched={} modified={}", outcome.matched, outcome.modified)
        });
        result
    }

    /// Removes every record matching `query`.
    pub fn try_delete(&self, query: impl Into<Bson>) -> ShelterResult<u64> {
        let started_at = Instant::now();
        let result = self.store().and_then(|store| {
            let filter = required_document(query.into(), "query")?;
            Ok(store.delete_many(filter)?)
        });
        log_outcome("delete", started_at, &result, |deleted| {
            format!("deleted={deleted}")
        });
        result
    }

    /// Legacy create: `true` iff the store acknowledged the insert.
    pub fn create(&self, data: impl Into<Bson>) -> bool {
        self.try_create(data).is_ok()
    }

    /// Legacy read: empty on no match and on any failure alike.
    pub fn read(&self, query: impl Into<Bson>, projection: impl Into<Bson>) -> Vec<Record> {
        self.try_read(query, projection).unwrap_or_default()
    }

    /// Legacy update: modified count, `0` on any failure.
    pub fn update(&self, query: impl Into<Bson>, new_values: impl Into<Bson>) -> u64 {
        self.try_update(query, new_values)
            .map(|outcome| outcome.modified)
            .unwrap_or(0)
    }

    /// Legacy delete: deleted count, `0` on any failure.
    pub fn delete(&self, query: impl Into<Bson>) -> u64 {
        self.try_delete(query).unwrap_or(0)
    }

    fn store(&self) -> ShelterResult<&S> {
        match &self.state {
            ShelterState::Connected(store) => Ok(store),
            ShelterState::Disabled { reason } => Err(ShelterError::Unavailable {
                reason: reason.clone(),
            }),
        }
    }
}

impl<S: DocumentStore> Drop for AnimalShelter<S> {
    fn drop(&mut self) {
        if let ShelterState::Connected(store) = &self.state {
            debug!(
                "event=shelter_close module=shelter status=ok target={}",
                store.describe()
            );
        }
    }
}

fn log_outcome<T>(
    operation: &'static str,
    started_at: Instant,
    result: &ShelterResult<T>,
    summarize: impl FnOnce(&T) -> String,
) {
    match result {
        Ok(value) => debug!(
            "event=shelter_{operation} module=shelter status=ok duration_ms={} {}",
            started_at.elapsed().as_millis(),
            summarize(value)
        ),
        Err(err) => error!(
            "event=shelter_{operation} module=shelter status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
