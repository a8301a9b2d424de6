//! Login and registration screens.
//!
//! Both check for blank fields before contacting the auth provider.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::auth::User;
use crate::error::Alert;
use crate::state::AppContext;

fn is_blank(email: &str, password: &SecretString) -> bool {
    email.trim().is_empty() || password.expose_secret().is_empty()
}

/// Email/password sign-in form.
pub struct LoginView {
    ctx: AppContext,
}

impl LoginView {
    #[must_use]
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns the alert to show when the fields are blank or sign-in fails.
    #[instrument(skip(self, password))]
    pub async fn submit(&self, email: &str, password: &SecretString) -> Result<User, Alert> {
        if is_blank(email, password) {
            return Err(Alert::title("Please enter email and password"));
        }
        self.ctx
            .session()
            .sign_in(email, password)
            .await
            .map_err(|e| {
                e.report("login");
                Alert::new("Login failed", e.user_message())
            })
    }
}

/// Account creation form.
pub struct RegisterView {
    ctx: AppContext,
}

impl RegisterView {
    #[must_use]
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Create an account. Always returns an alert to show.
    #[instrument(skip(self, password))]
    pub async fn submit(&self, email: &str, password: &SecretString) -> Alert {
        if is_blank(email, password) {
            return Alert::title("Please fill in all fields");
        }
        match self.ctx.session().sign_up(email, password).await {
            Ok(_) => Alert::new("Success", "Account created. You can now log in."),
            Err(e) => {
                e.report("register");
                Alert::new("Registration Error", e.user_message())
            }
        }
    }
}
