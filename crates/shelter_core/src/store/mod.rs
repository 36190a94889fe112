//! Document store seam and its backends.
//!
//! # Responsibility
//! - Define the one-collection contract the facade drives.
//! - Keep driver details (`mongodb`, `rusqlite`) behind that contract.
//!
//! # Invariants
//! - A store instance is bound to exactly one collection for its lifetime.
//! - Every method performs at most one logical round trip and never retries.
//! - `update_many` applies field-set semantics and reports modified, not
//!   merely matched, documents.

use crate::db::DbError;
use bson::{Bson, Document};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod matcher;
pub mod mongo;
pub mod sqlite;

pub use mongo::MongoStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by a store backend.
#[derive(Debug)]
pub enum StoreError {
    Mongo(mongodb::error::Error),
    Db(DbError),
    Codec(String),
    InvalidQuery(String),
    DuplicateKey(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mongo(err) => write!(f, "mongodb: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(message) => write!(f, "bson codec: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::DuplicateKey(key) => write!(f, "duplicate key: {key}"),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mongo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Codec(_) | Self::InvalidQuery(_) | Self::DuplicateKey(_) | Self::LockPoisoned => {
                None
            }
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(value: bson::ser::Error) -> Self {
        Self::Codec(value.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(value: bson::de::Error) -> Self {
        Self::Codec(value.to_string())
    }
}

/// Counts reported by a multi-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// One-collection document store contract.
///
/// Implementations must be usable from several threads when the facade is
/// shared; backends whose client is not `Sync` serialize access internally.
pub trait DocumentStore {
    /// Confirms the server is reachable and the session is authenticated.
    fn ping(&self) -> StoreResult<()>;

    /// Inserts one record and returns its store-assigned identity.
    fn insert_one(&self, record: Document) -> StoreResult<Bson>;

    /// Inserts a batch; partial-failure semantics belong to the backend.
    fn insert_many(&self, records: Vec<Document>) -> StoreResult<Vec<Bson>>;

    /// Returns every matching record, fully materialized, in store order.
    fn find(&self, filter: Document, projection: Option<Document>) -> StoreResult<Vec<Document>>;

    /// Applies `$set: fields` to every record matching `filter`.
    fn update_many(&self, filter: Document, fields: Document) -> StoreResult<UpdateOutcome>;

    /// Removes every record matching `filter` and returns the count.
    fn delete_many(&self, filter: Document) -> StoreResult<u64>;

    /// Short `database.collection` label used in log lines.
    fn describe(&self) -> String;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn insert_one(&self, record: Document) -> StoreResult<Bson> {
        (**self).insert_one(record)
    }

    fn insert_many(&self, records: Vec<Document>) -> StoreResult<Vec<Bson>> {
        (**self).insert_many(records)
    }

    fn find(&self, filter: Document, projection: Option<Document>) -> StoreResult<Vec<Document>> {
        (**self).find(filter, projection)
    }

    fn update_many(&self, filter: Document, fields: Document) -> StoreResult<UpdateOutcome> {
        (**self).update_many(filter, fields)
    }

    fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        (**self).delete_many(filter)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
