//! Order submission and history.
//!
//! Submitting writes the order first and then clears the cart in one batch.
//! The two steps are independent: if the batch fails the order stays stored
//! and the cart keeps its lines.

use serde::Serialize;
use tracing::{info, instrument, warn};

use pizza_cafe_core::{OrderId, UserId};

use crate::error::{AppError, Result};
use crate::models::{CartLine, Order, cart::compute_total};
use crate::store::{Batch, Direction, DocumentStore, Fields, Query, collections};

/// Body of a new order document; `createdAt` is added by the store.
#[derive(Serialize)]
struct NewOrder<'a> {
    items: &'a [CartLine],
    total: &'a str,
}

/// Turns cart snapshots into orders and lists past orders.
pub struct OrderSubmitter<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderSubmitter<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Store `lines` as a new order and delete exactly those lines from the cart.
    ///
    /// Lines added to the cart after `lines` was read are left in place.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyCart` without writing if `lines` is empty, and
    /// `AppError::Write` if the order insert or the cart batch fails.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn submit_order(&self, uid: &UserId, lines: &[CartLine]) -> Result<OrderId> {
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let total = compute_total(lines);
        let fields = Fields::from_serializable(&NewOrder {
            items: lines,
            total: &total,
        })
        .map_err(AppError::Write)?
        .with_server_timestamp("createdAt");

        let order_id = self
            .store
            .add(&collections::orders(uid), fields)
            .await
            .map(OrderId::new)
            .map_err(AppError::Write)?;

        let cart = collections::cart_items(uid);
        let mut batch = Batch::new();
        for line in lines {
            batch.delete(cart.doc(&line.id));
        }
        if let Err(e) = self.store.commit(batch).await {
            warn!(%order_id, error = %e, "Order stored but cart was not cleared");
            return Err(AppError::Write(e));
        }

        info!(%order_id, %total, "Order placed");
        Ok(order_id)
    }

    /// All of the user's orders, newest first.
    ///
    /// Orders without a `createdAt` are not listed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn load_orders(&self, uid: &UserId) -> Result<Vec<Order>> {
        let collection = collections::orders(uid);
        let query = Query::all().order_by("createdAt", Direction::Descending);
        let docs = self
            .store
            .query(&collection, &query)
            .await
            .map_err(AppError::Fetch)?;
        Ok(super::decode_all(&collection, &docs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pizza_cafe_core::{MenuItemId, Price, Quantity};
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStore, Operation};

    fn uid() -> UserId {
        UserId::new("u1")
    }

    fn line(id: &str, cents: i64, qty: i64) -> CartLine {
        CartLine {
            id: MenuItemId::new(id),
            name: id.to_string(),
            price: Price::from_cents(cents),
            image_url: None,
            quantity: Quantity::new(qty),
        }
    }

    async fn put_line(store: &MemoryStore, line: &CartLine) {
        store
            .set(
                &collections::cart_items(&uid()).doc(&line.id),
                Fields::new()
                    .with("name", line.name.clone())
                    .with("price", json!(line.price))
                    .with("quantity", line.quantity.get()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let err = OrderSubmitter::new(&store)
            .submit_order(&uid(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyCart));
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_stores_order_and_clears_cart() {
        let store = MemoryStore::new();
        let lines = vec![line("margherita", 999, 2), line("cola", 500, 1)];
        for l in &lines {
            put_line(&store, l).await;
        }

        let submitter = OrderSubmitter::new(&store);
        let order_id = submitter.submit_order(&uid(), &lines).await.unwrap();

        assert!(store.is_empty(&collections::cart_items(&uid())).await);
        let orders = submitter.load_orders(&uid()).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].total, "24.98");
        assert_eq!(orders[0].items, lines);
        assert!(orders[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_lines_added_after_snapshot_survive() {
        let store = MemoryStore::new();
        let snapshot = vec![line("margherita", 999, 1)];
        put_line(&store, &snapshot[0]).await;
        put_line(&store, &line("tiramisu", 650, 1)).await;

        OrderSubmitter::new(&store)
            .submit_order(&uid(), &snapshot)
            .await
            .unwrap();

        let cart = collections::cart_items(&uid());
        assert_eq!(store.len(&cart).await, 1);
        assert!(store.get(&cart.doc("tiramisu")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_order_and_cart() {
        let store = MemoryStore::new();
        let lines = vec![line("margherita", 999, 1)];
        put_line(&store, &lines[0]).await;
        store.fail_next(Operation::Commit, 1).await;

        let submitter = OrderSubmitter::new(&store);
        let err = submitter.submit_order(&uid(), &lines).await.unwrap_err();
        assert!(matches!(err, AppError::Write(_)));

        assert_eq!(store.len(&collections::orders(&uid())).await, 1);
        assert_eq!(store.len(&collections::cart_items(&uid())).await, 1);
    }

    #[tokio::test]
    async fn test_orders_listed_newest_first() {
        let store = MemoryStore::new();
        let submitter = OrderSubmitter::new(&store);
        let first = submitter
            .submit_order(&uid(), &[line("a", 100, 1)])
            .await
            .unwrap();
        let second = submitter
            .submit_order(&uid(), &[line("b", 200, 1)])
            .await
            .unwrap();

        let ids: Vec<_> = submitter
            .load_orders(&uid())
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }
}
