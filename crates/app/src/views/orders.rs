//! Order history screen.

use super::{Activity, apply_if_current};
use crate::models::Order;
use crate::services::OrderSubmitter;
use crate::state::AppContext;

/// The signed-in user's orders, newest first.
pub struct OrdersView {
    ctx: AppContext,
    activity: Activity,
    orders: Vec<Order>,
    loading: bool,
}

impl OrdersView {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            activity: Activity::default(),
            orders: Vec::new(),
            loading: true,
        }
    }

    /// Orders currently shown.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Whether the first load has not finished yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Handle for deactivating the view from elsewhere.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Show the screen and reload the orders. Failures are logged only.
    pub async fn activate(&mut self) {
        let ticket = self.activity.activate();
        let Some(uid) = self.ctx.session().current_user().map(|u| u.uid) else {
            return;
        };
        let result = OrderSubmitter::new(self.ctx.store()).load_orders(&uid).await;
        match result {
            Ok(orders) => {
                if apply_if_current(&self.activity, ticket, "orders", &mut self.orders, orders) {
                    self.loading = false;
                }
            }
            Err(e) => {
                e.report("load_orders");
                if self.activity.is_current(ticket) {
                    self.loading = false;
                }
            }
        }
    }

    /// Hide the screen.
    pub fn deactivate(&self) {
        self.activity.deactivate();
    }
}
