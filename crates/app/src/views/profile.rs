//! Profile screen.

use tracing::instrument;

use crate::error::Alert;
use crate::state::AppContext;

/// Account details and sign-out.
pub struct ProfileView {
    ctx: AppContext,
}

impl ProfileView {
    #[must_use]
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Email of the signed-in user.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.ctx
            .session()
            .current_user()
            .map(|user| user.email.to_string())
    }

    /// Display name, `"Pizza Lover"` when the account has none.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.ctx
            .session()
            .current_user()
            .map(|user| user.display_name_or_default().to_owned())
    }

    /// Sign out. Returns an alert only on failure.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Option<Alert> {
        match self.ctx.session().sign_out().await {
            Ok(()) => None,
            Err(e) => {
                e.report("logout");
                Some(Alert::new("Logout Error", e.user_message()))
            }
        }
    }
}
