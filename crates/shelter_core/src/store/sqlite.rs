//! Embedded document store on SQLite.
//!
//! # Responsibility
//! - Persist one collection's records as BSON blobs in the `documents` table.
//! - Evaluate filters, projections and `$set` in-process via [`super::matcher`].
//!
//! # Invariants
//! - Records come back in insertion order.
//! - Every stored record has an `_id`; missing ones get a fresh `ObjectId`.
//! - Multi-record writes are all-or-nothing (one SQLite transaction).
//! - `rusqlite::Connection` is not `Sync`, so access goes through a mutex.

use super::matcher::{apply_set, matches, project};
use super::{DocumentStore, StoreError, StoreResult, UpdateOutcome};
use crate::db::{open_db, open_db_in_memory};
use crate::model::record::ID_FIELD;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed store bound to one named collection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteStore {
    /// Opens (or creates) a database file and binds `collection`.
    pub fn open(path: impl AsRef<Path>, collection: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::bind(open_db(path)?, collection))
    }

    /// Opens a private in-memory database and binds `collection`.
    pub fn open_in_memory(collection: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::bind(open_db_in_memory()?, collection))
    }

    fn bind(conn: Connection, collection: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn with_conn<T>(&self, work: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        work(&mut conn)
    }
}

impl DocumentStore for SqliteStore {
    fn ping(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    fn insert_one(&self, record: Document) -> StoreResult<Bson> {
        self.with_conn(|conn| insert_record(conn, &self.collection, record))
    }

    fn insert_many(&self, records: Vec<Document>) -> StoreResult<Vec<Bson>> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(records.len());
            for record in records {
                ids.push(insert_record(&tx, &self.collection, record)?);
            }
            tx.commit()?;
            Ok(ids)
        })
    }

    fn find(&self, filter: Document, projection: Option<Document>) -> StoreResult<Vec<Document>> {
        validate_filter(&filter)?;
        if let Some(projection) = &projection {
            project(Document::new(), projection)?;
        }

        self.with_conn(|conn| {
            let mut found = Vec::new();
            for (_, record) in load_records(conn, &self.collection)? {
                if !matches(&record, &filter)? {
                    continue;
                }
                found.push(match &projection {
                    Some(projection) => project(record, projection)?,
                    None => record,
                });
            }
            Ok(found)
        })
    }

    fn update_many(&self, filter: Document, fields: Document) -> StoreResult<UpdateOutcome> {
        validate_filter(&filter)?;

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut outcome = UpdateOutcome::default();
            for (seq, mut record) in load_records(&tx, &self.collection)? {
                if !matches(&record, &filter)? {
                    continue;
                }
                outcome.matched += 1;
                if apply_set(&mut record, &fields)? {
                    tx.execute(
                        "UPDATE documents SET body = ?1 WHERE seq = ?2;",
                        params![encode(&record)?, seq],
                    )?;
                    outcome.modified += 1;
                }
            }
            tx.commit()?;
            Ok(outcome)
        })
    }

    fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        validate_filter(&filter)?;

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut deleted = 0;
            for (seq, record) in load_records(&tx, &self.collection)? {
                if matches(&record, &filter)? {
                    tx.execute("DELETE FROM documents WHERE seq = ?1;", [seq])?;
                    deleted += 1;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
    }

    fn describe(&self) -> String {
        format!("sqlite.{}", self.collection)
    }
}

/// Surfaces malformed filters even when the collection is empty.
fn validate_filter(filter: &Document) -> StoreResult<()> {
    matches(&Document::new(), filter).map(|_| ())
}

fn insert_record(conn: &Connection, collection: &str, record: Document) -> StoreResult<Bson> {
    let (id, record) = with_identity(record);
    let key = identity_key(&id);

    let inserted = conn.execute(
        "INSERT INTO documents (collection, doc_key, body) VALUES (?1, ?2, ?3);",
        params![collection, key, encode(&record)?],
    );

    match inserted {
        Ok(_) => Ok(id),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::DuplicateKey(key))
        }
        Err(err) => Err(err.into()),
    }
}

/// Puts `_id` first, generating one when the record has none.
fn with_identity(record: Document) -> (Bson, Document) {
    if let Some(id) = record.get(ID_FIELD) {
        return (id.clone(), record);
    }

    let id = Bson::ObjectId(ObjectId::new());
    let mut stored = Document::new();
    stored.insert(ID_FIELD, id.clone());
    for (key, value) in record {
        stored.insert(key, value);
    }
    (id, stored)
}

fn identity_key(id: &Bson) -> String {
    id.clone().into_canonical_extjson().to_string()
}

fn load_records(conn: &Connection, collection: &str) -> StoreResult<Vec<(i64, Document)>> {
    let mut stmt = conn.prepare(
        "SELECT seq, body
         FROM documents
         WHERE collection = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([collection])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let seq: i64 = row.get("seq")?;
        let body: Vec<u8> = row.get("body")?;
        records.push((seq, Document::from_reader(body.as_slice())?));
    }

    Ok(records)
}

fn encode(record: &Document) -> StoreResult<Vec<u8>> {
    let mut body = Vec::new();
    record.to_writer(&mut body)?;
    Ok(body)
}
