//! MongoDB backend over the official driver's blocking API.
//!
//! # Invariants
//! - The client is pooled and `Send + Sync`; no extra locking is needed.
//! - Timeouts are the driver defaults (server selection, socket).
//! - The connection is released when the store is dropped.

use super::{DocumentStore, StoreResult, UpdateOutcome};
use crate::config::ConnectionConfig;
use bson::{doc, Bson, Document};
use log::info;
use mongodb::sync::{Client, Collection};

const ADMIN_DATABASE: &str = "admin";

/// Store bound to one `database.collection` pair on one server.
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
    label: String,
}

impl MongoStore {
    /// Parses the connection string and selects database and collection.
    ///
    /// The driver connects lazily; reachability and authentication are only
    /// proven by [`DocumentStore::ping`].
    pub fn connect(config: &ConnectionConfig) -> StoreResult<Self> {
        info!(
            "event=store_connect module=store backend=mongodb uri={} target={}.{}",
            config.redacted_uri(),
            config.data_database,
            config.collection
        );

        let client = Client::with_uri_str(config.connection_uri())?;
        let collection = client
            .database(&config.data_database)
            .collection::<Document>(&config.collection);

        Ok(Self {
            client,
            collection,
            label: format!("{}.{}", config.data_database, config.collection),
        })
    }
}

impl DocumentStore for MongoStore {
    fn ping(&self) -> StoreResult<()> {
        self.client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "ping": 1 })
            .run()?;
        Ok(())
    }

    fn insert_one(&self, record: Document) -> StoreResult<Bson> {
        let result = self.collection.insert_one(record).run()?;
        Ok(result.inserted_id)
    }

    fn insert_many(&self, records: Vec<Document>) -> StoreResult<Vec<Bson>> {
        let result = self.collection.insert_many(records).run()?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    fn find(&self, filter: Document, projection: Option<Document>) -> StoreResult<Vec<Document>> {
        let mut action = self.collection.find(filter);
        if let Some(projection) = projection {
            action = action.projection(projection);
        }

        let cursor = action.run()?;
        let mut records = Vec::new();
        for record in cursor {
            records.push(record?);
        }
        Ok(records)
    }

    fn update_many(&self, filter: Document, fields: Document) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection
            .update_many(filter, doc! { "$set": fields })
            .run()?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        let result = self.collection.delete_many(filter).run()?;
        Ok(result.deleted_count)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
