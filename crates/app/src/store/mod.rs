//! Document store collaborator.
//!
//! All application data lives in a hierarchical document store: collections
//! of JSON documents, where a document may own sub-collections
//! (`cartItems/{uid}/items`). The application only needs per-document CRUD,
//! a single equality filter, a single ordering, a limit, and an atomic batch
//! of deletes.
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local, used by tests and demos
//! - [`PgDocumentStore`] - one JSONB row per document (`postgres` feature)
//!
//! # Server timestamps
//!
//! Writes may mark fields with [`Fields::with_server_timestamp`]. The backend
//! replaces them with its own clock at write time, encoded by
//! [`format_timestamp`] so string order equals chronological order.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use memory::{MemoryStore, Operation};
#[cfg(feature = "postgres")]
pub use postgres::PgDocumentStore;

/// Raw document body.
pub type FieldMap = serde_json::Map<String, Value>;

/// Errors returned by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A partial update targeted a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A stored document could not be decoded into the expected shape.
    #[error("corrupt document {path}: {reason}")]
    Corrupt {
        /// Path of the offending document.
        path: String,
        /// Decoder message.
        reason: String,
    },

    /// Fields could not be encoded as a JSON object.
    #[error("cannot encode fields: {0}")]
    Encode(String),

    /// Database error from sqlx.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// Paths
// =============================================================================

/// Slash-separated path of a collection, e.g. `orders/{uid}/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// A document inside this collection.
    #[must_use]
    pub fn doc(&self, id: impl AsRef<str>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.as_ref().to_owned(),
        }
    }

    /// The path as stored by backends.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// Collection that holds the document.
    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Document key within its collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A sub-collection owned by this document.
    #[must_use]
    pub fn collection_under(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{name}", self.collection.0, self.id))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Collections used by the application.
pub mod collections {
    use pizza_cafe_core::UserId;

    use super::CollectionPath;

    /// `menuItems`
    #[must_use]
    pub fn menu_items() -> CollectionPath {
        CollectionPath::root("menuItems")
    }

    /// `cartItems/{uid}/items`
    #[must_use]
    pub fn cart_items(uid: &UserId) -> CollectionPath {
        CollectionPath::root("cartItems")
            .doc(uid)
            .collection_under("items")
    }

    /// `orders/{uid}/orders`
    #[must_use]
    pub fn orders(uid: &UserId) -> CollectionPath {
        CollectionPath::root("orders").doc(uid).collection_under("orders")
    }

    /// `payments/{uid}/records`
    #[must_use]
    pub fn payments(uid: &UserId) -> CollectionPath {
        CollectionPath::root("payments")
            .doc(uid)
            .collection_under("records")
    }
}

// =============================================================================
// Documents and writes
// =============================================================================

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key within its collection.
    pub id: String,
    /// Document body.
    pub fields: FieldMap,
}

impl Document {
    /// Decode the body into `T`, reporting the path on failure.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, collection: &CollectionPath) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| StoreError::Corrupt {
            path: collection.doc(&self.id).to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode the body with the document key exposed as an `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the body does not match `T`.
    pub fn decode_with_id<T: DeserializeOwned>(
        &self,
        collection: &CollectionPath,
    ) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::Corrupt {
            path: collection.doc(&self.id).to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a single field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Fields to write, possibly containing server timestamp sentinels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: FieldMap,
    server_timestamps: Vec<String>,
}

impl Fields {
    /// Empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a serializable struct as the field set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Encode` if `value` is not a JSON object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, StoreError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(values)) => Ok(Self {
                values,
                server_timestamps: Vec::new(),
            }),
            Ok(other) => Err(StoreError::Encode(format!("expected an object, got {other}"))),
            Err(e) => Err(StoreError::Encode(e.to_string())),
        }
    }

    /// Set a literal field value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.server_timestamps.retain(|k| k != key);
        self.values.insert(key.to_owned(), value.into());
        self
    }

    /// Mark a field to be filled with the store's clock at write time.
    #[must_use]
    pub fn with_server_timestamp(mut self, key: &str) -> Self {
        self.values.remove(key);
        if !self.server_timestamps.iter().any(|k| k == key) {
            self.server_timestamps.push(key.to_owned());
        }
        self
    }

    /// Whether any field needs the server clock.
    #[must_use]
    pub fn needs_server_time(&self) -> bool {
        !self.server_timestamps.is_empty()
    }

    /// Replace sentinels with `now` and return the final body.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> FieldMap {
        let Self {
            mut values,
            server_timestamps,
        } = self;
        let stamp = format_timestamp(now);
        for key in server_timestamps {
            values.insert(key, Value::String(stamp.clone()));
        }
        values
    }
}

/// A group of deletes applied atomically by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    deletes: Vec<DocumentPath>,
}

impl Batch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a delete.
    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.deletes.push(path);
        self
    }

    /// Queued deletes.
    #[must_use]
    pub fn deletes(&self) -> &[DocumentPath] {
        &self.deletes
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deletes.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Sort direction of an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A collection query: at most one equality filter, one ordering and a limit.
///
/// Ordering by a field excludes documents that do not have that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Option<(String, Value)>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    /// Every document in the collection, in backend order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some((field.to_owned(), value.into()));
        self
    }

    /// Sort by `field`.
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_owned(), direction));
        self
    }

    /// Return at most `n` documents.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// The equality filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<(&str, &Value)> {
        self.filter.as_ref().map(|(f, v)| (f.as_str(), v))
    }

    /// The ordering, if any.
    #[must_use]
    pub fn ordering(&self) -> Option<(&str, Direction)> {
        self.order.as_ref().map(|(f, d)| (f.as_str(), *d))
    }

    /// The limit, if any.
    #[must_use]
    pub const fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Apply the query to an unordered set of documents.
    ///
    /// Used by backends that cannot push the query down.
    #[must_use]
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut docs: Vec<Document> = docs
            .into_iter()
            .filter(|doc| {
                self.filter()
                    .is_none_or(|(field, value)| doc.field(field) == Some(value))
            })
            .collect();

        if let Some((field, direction)) = self.ordering() {
            docs.retain(|doc| doc.field(field).is_some());
            docs.sort_by(|a, b| {
                let ord = compare_values(a.field(field), b.field(field));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(n) = self.limit {
            docs.truncate(n);
        }
        docs
    }
}

/// Total order over JSON values used for sorting.
///
/// Values of different kinds sort by kind: null, bool, number, string, array,
/// object.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Encode a server timestamp.
///
/// Fixed-width RFC 3339 with nanoseconds and a `Z` suffix.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a server timestamp written by [`format_timestamp`].
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// Store trait
// =============================================================================

/// Operations the application needs from a document store.
///
/// Implementations must be cheap to share behind an `Arc`.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a query against one collection.
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError>;

    /// Read one document.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Merge fields into an existing document.
    ///
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Create a document with a store-assigned id and return the id.
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Apply every operation in `batch`, or none of them.
    async fn commit(&self, batch: Batch) -> Result<(), StoreError>;
}

/// Generate a key for a document created by [`DocumentStore::add`].
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
