//! Validated CRUD facade over the shelter's animal document collection.
//!
//! Callers construct an [`AnimalShelter`] once; it either holds a live
//! collection handle or stays disabled, and every operation returns a plain
//! value instead of propagating store failures.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use bson::{bson, doc, Bson, Document, Regex};
pub use config::ConnectionConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{CreatePayload, InputError, Record, ID_FIELD};
pub use service::animal_shelter::{AnimalShelter, ShelterError, ShelterResult};
pub use store::{DocumentStore, MongoStore, SqliteStore, StoreError, StoreResult, UpdateOutcome};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
