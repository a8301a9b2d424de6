//! Per-screen view state.
//!
//! Each view owns the data its screen shows and turns service results into
//! [`Alert`](crate::error::Alert)s. Errors stop here: they are logged (and
//! backend failures captured) but never propagated.
//!
//! Views reload on every activation. A load that completes after the view
//! was deactivated, or activated again, is discarded; see [`Activity`].

pub mod auth;
pub mod cart;
pub mod home;
pub mod menu;
pub mod orders;
pub mod payment;
pub mod profile;

pub use auth::{LoginView, RegisterView};
pub use cart::CartView;
pub use home::HomeView;
pub use menu::MenuView;
pub use orders::OrdersView;
pub use payment::PaymentView;
pub use profile::ProfileView;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Activation tracking for one view.
///
/// Cloning yields a handle to the same view, so a screen can be deactivated
/// while one of its loads is still in flight.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    generation: Arc<AtomicU64>,
    active: Arc<AtomicBool>,
}

/// Marks the activation a load belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Activity {
    /// Start a new activation, invalidating loads from earlier ones.
    pub fn activate(&self) -> Ticket {
        self.active.store(true, Ordering::SeqCst);
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// End the current activation.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether the view is currently shown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Ticket for a load started now within the current activation.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation.load(Ordering::SeqCst))
    }

    /// Whether a result for `ticket` may still be applied.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.is_active() && self.generation.load(Ordering::SeqCst) == ticket.0
    }
}

/// Apply a load result if its activation is still current.
///
/// Returns `false` (and drops `value`) otherwise.
fn apply_if_current<T>(activity: &Activity, ticket: Ticket, view: &str, slot: &mut T, value: T) -> bool {
    if activity.is_current(ticket) {
        *slot = value;
        true
    } else {
        tracing::debug!(view, "Discarding result for inactive view");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_activity_is_inactive() {
        let activity = Activity::default();
        assert!(!activity.is_active());
        assert!(!activity.is_current(activity.ticket()));
    }

    #[test]
    fn test_deactivation_invalidates_ticket() {
        let activity = Activity::default();
        let ticket = activity.activate();
        assert!(activity.is_current(ticket));
        activity.deactivate();
        assert!(!activity.is_current(ticket));
    }

    #[test]
    fn test_reactivation_invalidates_older_ticket() {
        let activity = Activity::default();
        let first = activity.activate();
        let second = activity.activate();
        assert!(!activity.is_current(first));
        assert!(activity.is_current(second));
        assert_eq!(activity.ticket(), second);
    }

    #[test]
    fn test_clones_share_state() {
        let activity = Activity::default();
        let handle = activity.clone();
        let ticket = activity.activate();
        handle.deactivate();
        assert!(!activity.is_current(ticket));
    }

    #[test]
    fn test_apply_if_current() {
        let activity = Activity::default();
        let ticket = activity.activate();
        let mut slot = 1;
        assert!(apply_if_current(&activity, ticket, "test", &mut slot, 2));
        activity.deactivate();
        assert!(!apply_if_current(&activity, ticket, "test", &mut slot, 3));
        assert_eq!(slot, 2);
    }
}
