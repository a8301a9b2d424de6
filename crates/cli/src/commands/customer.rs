//! Customer flows: the same views a client app drives, printed to stdout.

#![allow(clippy::print_stdout)]

use secrecy::SecretString;
use tracing::info;

use pizza_cafe_app::views::{CartView, LoginView, MenuView, OrdersView, PaymentView, RegisterView};
use pizza_cafe_app::{Alert, AppContext};
use pizza_cafe_core::MenuItemId;

use super::CliError;

/// A signed-in customer session over the `PostgreSQL` backends.
pub struct Customer {
    ctx: AppContext,
}

impl Customer {
    #[must_use]
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Rejected` if registration fails.
    pub async fn register(&self, email: &str, password: &SecretString) -> Result<(), CliError> {
        let alert = RegisterView::new(self.ctx.clone())
            .submit(email, password)
            .await;
        expect_title(&alert, "Success")
    }

    /// Sign in; every other customer command needs this first.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Rejected` with the login alert on failure.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), CliError> {
        if let Err(e) = self.ctx.session().resolve().await {
            e.report("resolve_session");
        }
        let user = LoginView::new(self.ctx.clone())
            .submit(email, password)
            .await
            .map_err(|alert| CliError::Rejected(alert.to_string()))?;
        info!(uid = %user.uid, "Signed in as {}", user.display_name_or_default());
        Ok(())
    }

    /// Print the menu.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Rejected` if the menu cannot be loaded.
    pub async fn menu(&self) -> Result<(), CliError> {
        let view = self.load_menu().await?;
        if view.items().is_empty() {
            println!("The menu is empty.");
        }
        for item in view.items() {
            println!("{:<16} {:<24} {}", item.id.as_str(), item.name, item.price_label());
            if let Some(description) = &item.description {
                println!("{:<16} {description}", "");
            }
        }
        Ok(())
    }

    /// Print the cart and its total.
    ///
    /// # Errors
    ///
    /// Never fails; load errors are logged by the view.
    pub async fn cart_show(&self) -> Result<(), CliError> {
        let mut view = CartView::new(self.ctx.clone());
        view.activate().await;
        print_cart(&view);
        Ok(())
    }

    /// Add one unit of a menu item.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownItem` if the menu has no such item and
    /// `CliError::Rejected` if the add fails.
    pub async fn cart_add(&self, item_id: &str) -> Result<(), CliError> {
        let view = self.load_menu().await?;
        let item = view
            .items()
            .iter()
            .find(|item| item.id.as_str() == item_id)
            .ok_or_else(|| CliError::UnknownItem(item_id.to_owned()))?;
        let alert = view.add_to_cart(item).await;
        expect_title(&alert, "Success")
    }

    /// Change a line's quantity by `delta`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownItem` if the cart has no such line.
    pub async fn cart_change(&self, item_id: &str, delta: i64) -> Result<(), CliError> {
        let mut view = self.cart_with_line(item_id).await?;
        view.change_quantity(&MenuItemId::new(item_id), delta).await;
        print_cart(&view);
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownItem` if the cart has no such line.
    pub async fn cart_remove(&self, item_id: &str) -> Result<(), CliError> {
        let mut view = self.cart_with_line(item_id).await?;
        view.remove(&MenuItemId::new(item_id)).await;
        print_cart(&view);
        Ok(())
    }

    /// Order everything in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Rejected` if the cart is empty or the order fails.
    pub async fn order(&self) -> Result<(), CliError> {
        let mut view = CartView::new(self.ctx.clone());
        view.activate().await;
        let total = view.total();
        match view.place_order().await {
            Some(alert) => {
                expect_title(&alert, "Order Complete")?;
                println!("Total: ${total}");
                Ok(())
            }
            None => Err(CliError::Rejected("Not signed in".to_owned())),
        }
    }

    /// Print past orders, newest first.
    ///
    /// # Errors
    ///
    /// Never fails; load errors are logged by the view.
    pub async fn orders(&self) -> Result<(), CliError> {
        let mut view = OrdersView::new(self.ctx.clone());
        view.activate().await;
        if view.orders().is_empty() {
            println!("No orders yet.");
        }
        for order in view.orders() {
            println!(
                "Order #{}  {}  {}",
                order.id.short(),
                order.created_at_label(),
                order.total_label()
            );
            for line in &order.items {
                println!("    {} x{}", line.display_name(), line.quantity);
            }
        }
        Ok(())
    }

    /// Pay the most recent order.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Rejected` if there is nothing to pay or the payment fails.
    pub async fn pay(&self) -> Result<(), CliError> {
        let view = PaymentView::new(self.ctx.clone());
        view.activate().await;
        if view.latest_order().await.is_none() {
            return Err(CliError::Rejected("No orders found.".to_owned()));
        }
        match view.pay().await {
            Some(alert) => expect_title(&alert, "Success"),
            None => Err(CliError::Rejected("Order already paid.".to_owned())),
        }
    }

    /// Print the most recent order and its payment status.
    ///
    /// # Errors
    ///
    /// Never fails; load errors are logged by the view.
    pub async fn status(&self) -> Result<(), CliError> {
        let view = PaymentView::new(self.ctx.clone());
        view.activate().await;
        match (view.latest_order().await, view.status().await) {
            (Some(order), Some(status)) => {
                println!("Latest Order: #{}", order.id.short());
                println!("Total: {}", order.total_label());
                println!("Status: {status}");
            }
            _ => println!("No orders found."),
        }
        Ok(())
    }

    async fn load_menu(&self) -> Result<MenuView, CliError> {
        let mut view = MenuView::new(self.ctx.clone());
        if let Some(alert) = view.activate().await {
            return Err(CliError::Rejected(alert.to_string()));
        }
        Ok(view)
    }

    async fn cart_with_line(&self, item_id: &str) -> Result<CartView, CliError> {
        let mut view = CartView::new(self.ctx.clone());
        view.activate().await;
        if view.lines().iter().any(|line| line.id.as_str() == item_id) {
            Ok(view)
        } else {
            Err(CliError::UnknownItem(item_id.to_owned()))
        }
    }
}

fn print_cart(view: &CartView) {
    if view.lines().is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in view.lines() {
        println!(
            "{:<16} {:<24} {} x{}",
            line.id.as_str(),
            line.display_name(),
            line.price,
            line.quantity
        );
    }
    println!("Total: ${}", view.total());
}

/// Print `alert` and fail unless it carries the expected title.
fn expect_title(alert: &Alert, title: &str) -> Result<(), CliError> {
    println!("{alert}");
    if alert.title == title {
        Ok(())
    } else {
        Err(CliError::Rejected(alert.to_string()))
    }
}
