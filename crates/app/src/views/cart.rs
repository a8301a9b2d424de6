//! Cart screen.

use tracing::instrument;

use pizza_cafe_core::{MenuItemId, UserId};

use super::{Activity, apply_if_current};
use crate::error::{Alert, AppError};
use crate::models::CartLine;
use crate::services::{CartManager, OrderSubmitter, compute_total};
use crate::state::AppContext;

/// Cart lines, quantity controls and the order button.
///
/// Load and quantity failures are logged only; the screen keeps what it
/// showed before.
pub struct CartView {
    ctx: AppContext,
    activity: Activity,
    lines: Vec<CartLine>,
}

impl CartView {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            activity: Activity::default(),
            lines: Vec::new(),
        }
    }

    /// Lines currently shown.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total of the lines shown, e.g. `"24.98"`.
    #[must_use]
    pub fn total(&self) -> String {
        compute_total(&self.lines)
    }

    /// Handle for deactivating the view from elsewhere.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Show the screen and reload the cart.
    pub async fn activate(&mut self) {
        self.activity.activate();
        self.reload().await;
    }

    /// Hide the screen.
    pub fn deactivate(&self) {
        self.activity.deactivate();
    }

    /// Add `delta` to a line's quantity, then reload.
    #[instrument(skip(self))]
    pub async fn change_quantity(&mut self, line_id: &MenuItemId, delta: i64) {
        let Some(uid) = self.uid() else { return };
        let result = CartManager::new(self.ctx.store())
            .change_quantity(&uid, line_id, delta)
            .await;
        match result {
            Ok(_) => self.reload().await,
            Err(e) => e.report("change_quantity"),
        }
    }

    /// Delete a line, then reload.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, line_id: &MenuItemId) {
        let Some(uid) = self.uid() else { return };
        let result = CartManager::new(self.ctx.store())
            .remove_line(&uid, line_id)
            .await;
        match result {
            Ok(()) => self.reload().await,
            Err(e) => e.report("remove_line"),
        }
    }

    /// Submit the lines shown as an order.
    ///
    /// Returns `None` when nobody is signed in.
    #[instrument(skip(self), fields(line_count = self.lines.len()))]
    pub async fn place_order(&mut self) -> Option<Alert> {
        let uid = self.uid()?;
        let result = OrderSubmitter::new(self.ctx.store())
            .submit_order(&uid, &self.lines)
            .await;
        match result {
            Ok(_) => {
                self.lines.clear();
                Some(Alert::new("Order Complete", "Your order has been placed!"))
            }
            Err(AppError::EmptyCart) => {
                AppError::EmptyCart.report("submit_order");
                Some(Alert::new(
                    "Empty Cart",
                    "Please add items to the cart before ordering.",
                ))
            }
            Err(e) => {
                e.report("submit_order");
                Some(Alert::new("Error", "Could not complete order."))
            }
        }
    }

    fn uid(&self) -> Option<UserId> {
        self.ctx.session().current_user().map(|user| user.uid)
    }

    async fn reload(&mut self) {
        let Some(uid) = self.uid() else { return };
        let ticket = self.activity.ticket();
        let result = CartManager::new(self.ctx.store()).load_cart(&uid).await;
        match result {
            Ok(lines) => {
                apply_if_current(&self.activity, ticket, "cart", &mut self.lines, lines);
            }
            Err(e) => e.report("load_cart"),
        }
    }
}
