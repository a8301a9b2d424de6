//! Unified error handling with Sentry integration.
//!
//! Service methods return `Result<T, AppError>`. Views catch every error at the
//! operation boundary, call [`AppError::report`] and turn it into an
//! [`Alert`]; nothing propagates further.

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::token_cache::TokenCacheError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading menu, cart, order or payment documents failed.
    #[error("Fetch error: {0}")]
    Fetch(#[source] StoreError),

    /// Adding, updating, deleting or committing documents failed.
    #[error("Write error: {0}")]
    Write(#[source] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Local token cache failed.
    #[error("Token cache error: {0}")]
    TokenCache(#[from] TokenCacheError),

    /// Order submission with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// Payment attempted on an order already shown as paid.
    #[error("Order already paid")]
    AlreadyPaid,

    /// Payment attempted while another payment is outstanding.
    #[error("Payment already in progress")]
    PaymentInFlight,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or migration failed.
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Whether the failure came from a collaborator rather than user input.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Write(_) | Self::TokenCache(_) | Self::Config(_) => true,
            #[cfg(feature = "postgres")]
            Self::Database(_) => true,
            Self::Auth(err) => err.is_backend_failure(),
            Self::EmptyCart | Self::NotSignedIn | Self::AlreadyPaid | Self::PaymentInFlight => {
                false
            }
        }
    }

    /// Log the error and capture backend failures to Sentry.
    pub fn report(&self, operation: &str) {
        if self.is_backend_failure() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                operation,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::warn!(error = %self, operation, "Operation rejected");
        }
    }

    /// Message safe to show the user.
    ///
    /// Auth errors carry the provider's wording; everything else hides
    /// internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) if !err.is_backend_failure() => err.to_string(),
            Self::Auth(_) => "A network error occurred. Please try again.".to_string(),
            Self::Fetch(_) | Self::Write(_) | Self::TokenCache(_) | Self::Config(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            #[cfg(feature = "postgres")]
            Self::Database(_) => "Something went wrong. Please try again.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// A user-facing notification produced by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Headline.
    pub title: String,
    /// Optional body text.
    pub message: Option<String>,
}

impl Alert {
    /// Alert with a title and body.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: Some(message.into()),
        }
    }

    /// Alert with a title only.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: None,
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "margherita")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
