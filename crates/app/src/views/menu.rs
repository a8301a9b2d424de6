//! Menu screen.

use tracing::instrument;

use super::{Activity, apply_if_current};
use crate::error::{Alert, AppError, add_breadcrumb};
use crate::models::MenuItem;
use crate::services::{CartManager, MenuCatalog};
use crate::state::AppContext;

/// Menu list plus the add-to-cart action.
pub struct MenuView {
    ctx: AppContext,
    activity: Activity,
    items: Vec<MenuItem>,
}

impl MenuView {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            activity: Activity::default(),
            items: Vec::new(),
        }
    }

    /// Items currently shown.
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Handle for deactivating the view from elsewhere.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Show the screen and reload the menu.
    ///
    /// On failure the previous list stays on screen.
    #[instrument(skip(self))]
    pub async fn activate(&mut self) -> Option<Alert> {
        let ticket = self.activity.activate();
        let result = MenuCatalog::new(self.ctx.store()).load_menu().await;
        match result {
            Ok(items) => {
                apply_if_current(&self.activity, ticket, "menu", &mut self.items, items);
                None
            }
            Err(e) => {
                e.report("load_menu");
                self.activity
                    .is_current(ticket)
                    .then(|| Alert::new("Error", "Could not load menu."))
            }
        }
    }

    /// Hide the screen.
    pub fn deactivate(&self) {
        self.activity.deactivate();
    }

    /// Add one unit of `item` to the signed-in user's cart.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_to_cart(&self, item: &MenuItem) -> Alert {
        let Some(user) = self.ctx.session().current_user() else {
            AppError::NotSignedIn.report("add_to_cart");
            return Alert::new("Error", "User not logged in");
        };

        match CartManager::new(self.ctx.store())
            .add_or_increment(&user.uid, item)
            .await
        {
            Ok(_) => {
                add_breadcrumb("cart", "Added item", Some(&[("item_id", item.id.as_str())]));
                Alert::new("Success", format!("{} added to cart", item.name))
            }
            Err(e) => {
                e.report("add_to_cart");
                Alert::new("Error", "Could not add to cart")
            }
        }
    }
}
