//! Payment recording.
//!
//! A payment record points at its order by `orderId`. The store enforces no
//! uniqueness, so [`PaymentRecorder::pay`] writes a new record every time it
//! is called; callers guard against paying twice.

use tracing::{info, instrument};

use pizza_cafe_core::{PaymentId, PaymentStatus, UserId};

use crate::error::{AppError, Result};
use crate::models::Order;
use crate::store::{Direction, Document, DocumentStore, Fields, Query, collections};

/// The user's most recent order and whether it has been paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestOrder {
    pub order: Order,
    pub status: PaymentStatus,
}

/// Reads payment status and records payments.
pub struct PaymentRecorder<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> PaymentRecorder<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// The most recent order and the status of its first payment record.
    ///
    /// Returns `None` when the user has no orders. Status is `Pending` when
    /// no record exists for the order, and also when the payment records
    /// cannot be read; that failure is reported and the order is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the order read fails or the latest order
    /// cannot be decoded.
    #[instrument(skip(self))]
    pub async fn load_latest_order_and_status(&self, uid: &UserId) -> Result<Option<LatestOrder>> {
        let orders = collections::orders(uid);
        let latest = self
            .store
            .query(
                &orders,
                &Query::all()
                    .order_by("createdAt", Direction::Descending)
                    .limit(1),
            )
            .await
            .map_err(AppError::Fetch)?;
        let Some(doc) = latest.first() else {
            return Ok(None);
        };
        let order: Order = doc.decode_with_id(&orders).map_err(AppError::Fetch)?;

        let records = self
            .store
            .query(
                &collections::payments(uid),
                &Query::all()
                    .where_eq("orderId", order.id.as_str())
                    .limit(1),
            )
            .await;
        let status = match records {
            Ok(records) => records.first().map_or(PaymentStatus::Pending, record_status),
            Err(e) => {
                AppError::Fetch(e).report("load_payment_status");
                PaymentStatus::Pending
            }
        };

        Ok(Some(LatestOrder { order, status }))
    }

    /// Record a payment of `order.total` against `order`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Write` if the store rejects the record.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn pay(&self, uid: &UserId, order: &Order) -> Result<PaymentId> {
        let fields = Fields::new()
            .with("orderId", order.id.as_str())
            .with("amount", order.total.as_str())
            .with("status", PaymentStatus::Paid.to_string())
            .with_server_timestamp("paidAt");

        let payment_id = self
            .store
            .add(&collections::payments(uid), fields)
            .await
            .map(PaymentId::new)
            .map_err(AppError::Write)?;

        info!(%payment_id, amount = %order.total, "Payment recorded");
        Ok(payment_id)
    }
}

/// Status stored on a payment record; unknown values read as `Pending`.
fn record_status(doc: &Document) -> PaymentStatus {
    doc.field("status")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::PaymentRecord;
    use crate::store::{
        Batch, CollectionPath, DocumentPath, MemoryStore, Operation, StoreError,
    };

    /// Fails every query under `payments/`, delegating everything else.
    struct PaymentsUnavailable(MemoryStore);

    #[async_trait::async_trait]
    impl DocumentStore for PaymentsUnavailable {
        async fn query(
            &self,
            collection: &CollectionPath,
            query: &Query,
        ) -> std::result::Result<Vec<Document>, StoreError> {
            if collection.as_str().starts_with("payments/") {
                return Err(StoreError::Unavailable("payments down".to_string()));
            }
            self.0.query(collection, query).await
        }

        async fn get(
            &self,
            path: &DocumentPath,
        ) -> std::result::Result<Option<Document>, StoreError> {
            self.0.get(path).await
        }

        async fn set(&self, path: &DocumentPath, fields: Fields) -> std::result::Result<(), StoreError> {
            self.0.set(path, fields).await
        }

        async fn update(
            &self,
            path: &DocumentPath,
            fields: Fields,
        ) -> std::result::Result<(), StoreError> {
            self.0.update(path, fields).await
        }

        async fn add(
            &self,
            collection: &CollectionPath,
            fields: Fields,
        ) -> std::result::Result<String, StoreError> {
            self.0.add(collection, fields).await
        }

        async fn delete(&self, path: &DocumentPath) -> std::result::Result<(), StoreError> {
            self.0.delete(path).await
        }

        async fn commit(&self, batch: Batch) -> std::result::Result<(), StoreError> {
            self.0.commit(batch).await
        }
    }

    fn uid() -> UserId {
        UserId::new("u1")
    }

    async fn place_order(store: &MemoryStore, total: &str) -> String {
        store
            .add(
                &collections::orders(&uid()),
                Fields::new()
                    .with("items", json!([]))
                    .with("total", total)
                    .with_server_timestamp("createdAt"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_orders() {
        let store = MemoryStore::new();
        let latest = PaymentRecorder::new(&store)
            .load_latest_order_and_status(&uid())
            .await
            .unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_pay_flips_status_to_paid() {
        let store = MemoryStore::new();
        place_order(&store, "24.98").await;
        let recorder = PaymentRecorder::new(&store);

        let latest = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.status, PaymentStatus::Pending);

        recorder.pay(&uid(), &latest.order).await.unwrap();

        let reloaded = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.order.id, latest.order.id);
        assert_eq!(reloaded.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_record_shape() {
        let store = MemoryStore::new();
        place_order(&store, "12.50").await;
        let recorder = PaymentRecorder::new(&store);
        let latest = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        let payment_id = recorder.pay(&uid(), &latest.order).await.unwrap();

        let payments = collections::payments(&uid());
        let doc = store.get(&payments.doc(&payment_id)).await.unwrap().unwrap();
        let record: PaymentRecord = doc.decode_with_id(&payments).unwrap();
        assert_eq!(record.order_id, latest.order.id);
        assert_eq!(record.amount, "12.50");
        assert_eq!(record.status, PaymentStatus::Paid);
        assert!(record.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_only_latest_order_is_considered() {
        let store = MemoryStore::new();
        place_order(&store, "5.00").await;
        let recorder = PaymentRecorder::new(&store);
        let first = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        recorder.pay(&uid(), &first.order).await.unwrap();

        place_order(&store, "7.00").await;
        let latest = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.order.total, "7.00");
        assert_eq!(latest.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_pay_does_not_deduplicate() {
        let store = MemoryStore::new();
        place_order(&store, "5.00").await;
        let recorder = PaymentRecorder::new(&store);
        let latest = recorder
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();

        recorder.pay(&uid(), &latest.order).await.unwrap();
        recorder.pay(&uid(), &latest.order).await.unwrap();
        assert_eq!(store.len(&collections::payments(&uid())).await, 2);
    }

    #[tokio::test]
    async fn test_order_read_failure() {
        let store = MemoryStore::new();
        place_order(&store, "5.00").await;
        store.fail_next(Operation::Query, 1).await;
        let err = PaymentRecorder::new(&store)
            .load_latest_order_and_status(&uid())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_payment_read_failure_keeps_order_as_pending() {
        let memory = MemoryStore::new();
        place_order(&memory, "9.99").await;
        let store = PaymentsUnavailable(memory);

        let latest = PaymentRecorder::new(&store)
            .load_latest_order_and_status(&uid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.order.total, "9.99");
        assert_eq!(latest.status, PaymentStatus::Pending);
    }
}
