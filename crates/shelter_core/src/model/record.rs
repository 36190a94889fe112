//! Record, filter and payload shapes.
//!
//! Caller input arrives as [`Bson`] so that "absent", "not a mapping" and
//! "scalar payload" remain representable and rejectable without I/O.
//! `Bson::Null` stands for an absent argument.

use bson::{Bson, Document};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One document in the target collection.
pub type Record = Document;

/// Reserved identity field assigned by the store.
pub const ID_FIELD: &str = "_id";

/// Shape error in caller-supplied arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    MissingData,
    EmptyBatch,
    UnsupportedPayload {
        found: &'static str,
    },
    NonDocumentElement {
        index: usize,
        found: &'static str,
    },
    NotADocument {
        argument: &'static str,
        found: &'static str,
    },
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingData => write!(f, "no data provided to insert"),
            Self::EmptyBatch => write!(f, "no records provided in batch insert"),
            Self::UnsupportedPayload { found } => write!(
                f,
                "data must be a record or sequence of records, got {found}"
            ),
            Self::NonDocumentElement { index, found } => write!(
                f,
                "batch element {index} must be a record, got {found}"
            ),
            Self::NotADocument { argument, found } => {
                write!(f, "{argument} must be a document, got {found}")
            }
        }
    }
}

impl Error for InputError {}

/// Validated create payload with identity fields already removed.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatePayload {
    One(Record),
    Many(Vec<Record>),
}

impl CreatePayload {
    /// Classifies create input and strips `_id` from every record.
    ///
    /// # Errors
    /// - `MissingData` for `Bson::Null`.
    /// - `EmptyBatch` for an empty array.
    /// - `NonDocumentElement` when any array element is not a document.
    /// - `UnsupportedPayload` for every other shape.
    pub fn from_bson(data: Bson) -> Result<Self, InputError> {
        match data {
            Bson::Null => Err(InputError::MissingData),
            Bson::Document(record) => Ok(Self::One(strip_identity(record))),
            Bson::Array(items) if items.is_empty() => Err(InputError::EmptyBatch),
            Bson::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Bson::Document(record) => Ok(strip_identity(record)),
                    other => Err(InputError::NonDocumentElement {
                        index,
                        found: type_name(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(InputError::UnsupportedPayload {
                found: type_name(&other),
            }),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the caller-supplied identity so the store assigns one.
pub fn strip_identity(mut record: Record) -> Record {
    record.remove(ID_FIELD);
    record
}

/// Accepts a document or an absent value.
pub fn optional_document(
    value: Bson,
    argument: &'static str,
) -> Result<Option<Document>, InputError> {
    match value {
        Bson::Null => Ok(None),
        Bson::Document(doc) => Ok(Some(doc)),
        other => Err(InputError::NotADocument {
            argument,
            found: type_name(&other),
        }),
    }
}

/// Accepts a document only; an absent value is a shape error.
pub fn required_document(value: Bson, argument: &'static str) -> Result<Document, InputError> {
    match value {
        Bson::Document(doc) => Ok(doc),
        other => Err(InputError::NotADocument {
            argument,
            found: type_name(&other),
        }),
    }
}

/// Human-readable BSON type name used in diagnostics.
pub fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => "javascript",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}
