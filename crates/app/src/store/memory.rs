//! In-process document store.
//!
//! Keeps every collection in a `BTreeMap`, so unordered queries return
//! documents sorted by id. Cloning the store shares the same data, which lets
//! two sessions (or two "devices") operate on one backend in tests.
//!
//! Failures can be injected per operation to exercise the error paths of the
//! services without a real backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::{
    Batch, CollectionPath, Document, DocumentPath, DocumentStore, FieldMap, Fields, Query,
    StoreError, new_document_id,
};

/// Store operations, used for failure injection and write accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Get,
    Set,
    Update,
    Add,
    Delete,
    Commit,
}

impl Operation {
    const fn is_write(self) -> bool {
        !matches!(self, Self::Query | Self::Get)
    }
}

/// Process-local [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<String, BTreeMap<String, FieldMap>>,
    last_timestamp: Option<DateTime<Utc>>,
    pending_failures: HashMap<Operation, usize>,
    writes: usize,
}

impl Inner {
    /// Consume an injected failure for `op`, if any, and count writes.
    fn begin(&mut self, op: Operation) -> Result<(), StoreError> {
        if let Some(remaining) = self.pending_failures.get_mut(&op)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(StoreError::Unavailable(format!("injected {op:?} failure")));
        }
        if op.is_write() {
            self.writes += 1;
        }
        Ok(())
    }

    /// Strictly increasing server clock.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp
            && now <= last
        {
            now = last + Duration::nanoseconds(1);
        }
        self.last_timestamp = Some(now);
        now
    }

    fn resolve(&mut self, fields: Fields) -> FieldMap {
        if fields.needs_server_time() {
            let now = self.now();
            fields.resolve(now)
        } else {
            fields.resolve(Utc::now())
        }
    }

    fn collection_mut(&mut self, path: &CollectionPath) -> &mut BTreeMap<String, FieldMap> {
        self.collections.entry(path.as_str().to_owned()).or_default()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `op` fail with `StoreError::Unavailable`.
    pub async fn fail_next(&self, op: Operation, times: usize) {
        self.inner.lock().await.pending_failures.insert(op, times);
    }

    /// Number of successful write operations so far.
    pub async fn write_count(&self) -> usize {
        self.inner.lock().await.writes
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &CollectionPath) -> usize {
        self.inner
            .lock()
            .await
            .collections
            .get(collection.as_str())
            .map_or(0, BTreeMap::len)
    }

    /// Whether `collection` holds no documents.
    pub async fn is_empty(&self, collection: &CollectionPath) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Query)?;
        let docs = inner
            .collections
            .get(collection.as_str())
            .into_iter()
            .flatten()
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            });
        Ok(query.apply(docs))
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Get)?;
        Ok(inner
            .collections
            .get(path.collection().as_str())
            .and_then(|docs| docs.get(path.id()))
            .map(|fields| Document {
                id: path.id().to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Set)?;
        let body = inner.resolve(fields);
        inner
            .collection_mut(path.collection())
            .insert(path.id().to_owned(), body);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let exists = inner
            .collections
            .get(path.collection().as_str())
            .is_some_and(|docs| docs.contains_key(path.id()));
        if !exists {
            return Err(StoreError::NotFound(path.to_string()));
        }
        inner.begin(Operation::Update)?;
        let body = inner.resolve(fields);
        if let Some(doc) = inner.collection_mut(path.collection()).get_mut(path.id()) {
            doc.extend(body);
        }
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Add)?;
        let id = new_document_id();
        let body = inner.resolve(fields);
        inner.collection_mut(collection).insert(id.clone(), body);
        Ok(id)
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Delete)?;
        if let Some(docs) = inner.collections.get_mut(path.collection().as_str()) {
            docs.remove(path.id());
        }
        Ok(())
    }

    async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        // The lock is held for the whole batch, so no reader sees it half-applied.
        let mut inner = self.inner.lock().await;
        inner.begin(Operation::Commit)?;
        for path in batch.deletes() {
            if let Some(docs) = inner.collections.get_mut(path.collection().as_str()) {
                docs.remove(path.id());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::Direction;

    fn items() -> CollectionPath {
        CollectionPath::root("items")
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryStore::new();
        let path = items().doc("margherita");
        store
            .set(&path, Fields::new().with("name", "Margherita"))
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.id, "margherita");
        assert_eq!(doc.field("name"), Some(&json!("Margherita")));
        assert!(store.get(&items().doc("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing_document() {
        let store = MemoryStore::new();
        let path = items().doc("a");
        assert!(matches!(
            store.update(&path, Fields::new().with("quantity", 2)).await,
            Err(StoreError::NotFound(_))
        ));

        store
            .set(&path, Fields::new().with("name", "A").with("quantity", 1))
            .await
            .unwrap();
        store
            .update(&path, Fields::new().with("quantity", 2))
            .await
            .unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.field("name"), Some(&json!("A")));
        assert_eq!(doc.field("quantity"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_add_assigns_increasing_server_timestamps() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store
                .add(&items(), Fields::new().with_server_timestamp("createdAt"))
                .await
                .unwrap();
        }
        let docs = store
            .query(
                &items(),
                &Query::all().order_by("createdAt", Direction::Ascending),
            )
            .await
            .unwrap();
        let stamps: Vec<_> = docs
            .iter()
            .map(|d| d.field("createdAt").unwrap().as_str().unwrap().to_owned())
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(stamps, sorted);
        assert_eq!(stamps.len(), 5);
    }

    #[tokio::test]
    async fn test_commit_deletes_all_or_nothing() {
        let store = MemoryStore::new();
        for id in ["a", "b"] {
            store.set(&items().doc(id), Fields::new()).await.unwrap();
        }

        let mut batch = Batch::new();
        batch.delete(items().doc("a")).delete(items().doc("b"));

        store.fail_next(Operation::Commit, 1).await;
        assert!(store.commit(batch.clone()).await.is_err());
        assert_eq!(store.len(&items()).await, 2);

        store.commit(batch).await.unwrap();
        assert!(store.is_empty(&items()).await);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next(Operation::Query, 1).await;
        assert!(store.query(&items(), &Query::all()).await.is_err());
        assert!(store.query(&items(), &Query::all()).await.is_ok());
    }

    #[tokio::test]
    async fn test_write_count_ignores_reads_and_failures() {
        let store = MemoryStore::new();
        store.query(&items(), &Query::all()).await.unwrap();
        store.fail_next(Operation::Add, 1).await;
        let _ = store.add(&items(), Fields::new()).await;
        assert_eq!(store.write_count().await, 0);

        store.add(&items(), Fields::new()).await.unwrap();
        assert_eq!(store.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set(&items().doc("x"), Fields::new()).await.unwrap();
        assert!(b.get(&items().doc("x")).await.unwrap().is_some());
    }
}
