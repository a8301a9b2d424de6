//! Payment screen.
//!
//! Shows the latest order and lets the user pay it. The store accepts any
//! number of payment records per order, so this view refuses to pay while the
//! order is shown as paid or while a payment is still in flight.

use tokio::sync::Mutex;
use tracing::instrument;

use pizza_cafe_core::PaymentStatus;

use super::Activity;
use crate::error::{Alert, AppError, add_breadcrumb};
use crate::models::Order;
use crate::services::{LatestOrder, PaymentRecorder};
use crate::state::AppContext;

#[derive(Debug, Default)]
struct PaymentState {
    loading: bool,
    latest: Option<LatestOrder>,
    in_flight: bool,
}

/// Latest order, its payment status and the pay action.
///
/// Methods take `&self` so several triggers (a double tap) can reach the
/// same view concurrently.
pub struct PaymentView {
    ctx: AppContext,
    activity: Activity,
    state: Mutex<PaymentState>,
}

impl PaymentView {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            activity: Activity::default(),
            state: Mutex::new(PaymentState {
                loading: true,
                ..PaymentState::default()
            }),
        }
    }

    /// Handle for deactivating the view from elsewhere.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Whether the load has not finished yet.
    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    /// The order shown, if the user has any.
    pub async fn latest_order(&self) -> Option<Order> {
        self.state
            .lock()
            .await
            .latest
            .as_ref()
            .map(|latest| latest.order.clone())
    }

    /// Payment status of the order shown.
    pub async fn status(&self) -> Option<PaymentStatus> {
        self.state.lock().await.latest.as_ref().map(|l| l.status)
    }

    /// Show the screen and load the latest order. Failures are logged only.
    pub async fn activate(&self) {
        let ticket = self.activity.activate();
        let Some(user) = self.ctx.session().current_user() else {
            return;
        };

        let result = PaymentRecorder::new(self.ctx.store())
            .load_latest_order_and_status(&user.uid)
            .await;
        if !self.activity.is_current(ticket) {
            tracing::debug!(view = "payment", "Discarding result for inactive view");
            return;
        }

        let mut state = self.state.lock().await;
        match result {
            Ok(latest) => state.latest = latest,
            Err(e) => e.report("load_latest_order_and_status"),
        }
        state.loading = false;
    }

    /// Hide the screen.
    pub fn deactivate(&self) {
        self.activity.deactivate();
    }

    /// Pay the order shown.
    ///
    /// Returns `None` when there is nothing to pay, the payment is refused
    /// by the paid/in-flight guard, or the view was deactivated before the
    /// payment completed. A payment that completes for an inactive view is
    /// still recorded; the next activation reads its status from the store.
    #[instrument(skip(self))]
    pub async fn pay(&self) -> Option<Alert> {
        let ticket = self.activity.ticket();
        let user = self.ctx.session().current_user()?;
        let order = {
            let mut state = self.state.lock().await;
            let latest = state.latest.as_ref()?;
            let refusal = if !latest.status.is_payable() {
                Some(AppError::AlreadyPaid)
            } else if state.in_flight {
                Some(AppError::PaymentInFlight)
            } else {
                None
            };
            if let Some(e) = refusal {
                e.report("pay");
                return None;
            }
            let order = latest.order.clone();
            state.in_flight = true;
            order
        };

        let result = PaymentRecorder::new(self.ctx.store())
            .pay(&user.uid, &order)
            .await;

        let mut state = self.state.lock().await;
        state.in_flight = false;
        if !self.activity.is_current(ticket) {
            if let Err(e) = &result {
                e.report("pay");
            }
            tracing::debug!(view = "payment", "Discarding payment result for inactive view");
            return None;
        }
        match result {
            Ok(_) => {
                if let Some(latest) = state.latest.as_mut().filter(|l| l.order.id == order.id) {
                    latest.status = PaymentStatus::Paid;
                }
                add_breadcrumb("payment", "Order paid", Some(&[("order_id", order.id.as_str())]));
                Some(Alert::new("Success", "Payment completed!"))
            }
            Err(e) => {
                e.report("pay");
                Some(Alert::new("Error", "Could not process payment."))
            }
        }
    }
}
