//! Home screen.

use tracing::instrument;

use crate::error::Alert;
use crate::state::AppContext;

/// Greeting and sign-out.
pub struct HomeView {
    ctx: AppContext,
}

impl HomeView {
    #[must_use]
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// `"Logged in as: {email}"`, or `None` when signed out.
    #[must_use]
    pub fn greeting(&self) -> Option<String> {
        self.ctx
            .session()
            .current_user()
            .map(|user| format!("Logged in as: {}", user.email))
    }

    /// Sign out. Returns an alert only on failure.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Option<Alert> {
        match self.ctx.session().sign_out().await {
            Ok(()) => None,
            Err(e) => {
                e.report("logout");
                Some(Alert::new("Logout Failed", e.user_message()))
            }
        }
    }
}
