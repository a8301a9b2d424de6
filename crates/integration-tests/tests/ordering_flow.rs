//! Menu → cart → order → payment, driven through the views.

#![allow(clippy::unwrap_used)]

use pizza_cafe_app::Alert;
use pizza_cafe_app::store::{Operation, collections};
use pizza_cafe_app::views::{CartView, MenuView, OrdersView, PaymentView};
use pizza_cafe_core::{MenuItemId, PaymentStatus, Quantity};
use pizza_cafe_integration_tests::{TestApp, menu_item, sample_menu};

async fn add(app: &TestApp, id: &str, times: usize) {
    let mut menu = MenuView::new(app.ctx.clone());
    assert!(menu.activate().await.is_none());
    let item = menu
        .items()
        .iter()
        .find(|item| item.id.as_str() == id)
        .cloned()
        .unwrap();
    for _ in 0..times {
        assert_eq!(menu.add_to_cart(&item).await.title, "Success");
    }
}

#[tokio::test]
async fn test_menu_lists_seeded_items() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;

    let mut menu = MenuView::new(app.ctx.clone());
    assert!(menu.activate().await.is_none());
    assert_eq!(menu.items().len(), 3);
}

#[tokio::test]
async fn test_menu_load_failure_keeps_previous_list() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;

    let mut menu = MenuView::new(app.ctx.clone());
    menu.activate().await;
    app.store.fail_next(Operation::Query, 1).await;

    let alert = menu.activate().await;
    assert_eq!(alert, Some(Alert::new("Error", "Could not load menu.")));
    assert_eq!(menu.items().len(), 3);
}

#[tokio::test]
async fn test_add_to_cart_alerts() {
    let (app, _) = TestApp::signed_in().await;
    let margherita = menu_item("margherita", "Margherita", 999);
    app.seed_menu(std::slice::from_ref(&margherita)).await;

    let menu = MenuView::new(app.ctx.clone());
    assert_eq!(
        menu.add_to_cart(&margherita).await,
        Alert::new("Success", "Margherita added to cart")
    );

    app.store.fail_next(Operation::Update, 1).await;
    assert_eq!(
        menu.add_to_cart(&margherita).await,
        Alert::new("Error", "Could not add to cart")
    );
}

#[tokio::test]
async fn test_add_to_cart_requires_user() {
    let app = TestApp::new();
    app.ctx.session().resolve().await.unwrap();

    let alert = MenuView::new(app.ctx.clone())
        .add_to_cart(&menu_item("cola", "Cola", 500))
        .await;
    assert_eq!(alert, Alert::new("Error", "User not logged in"));
    assert_eq!(app.store.write_count().await, 0);
}

#[tokio::test]
async fn test_adding_twice_makes_one_line_of_two() {
    let (app, user) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "margherita", 2).await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, Quantity::new(2));
    assert_eq!(app.store.len(&collections::cart_items(&user.uid)).await, 1);
}

#[tokio::test]
async fn test_decrementing_last_unit_removes_line() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "cola", 1).await;
    add(&app, "diavola", 3).await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    cart.change_quantity(&MenuItemId::new("cola"), -1).await;
    cart.change_quantity(&MenuItemId::new("diavola"), -3).await;

    assert!(cart.lines().is_empty());
    assert_eq!(cart.total(), "0.00");
}

#[tokio::test]
async fn test_remove_line_reloads_cart() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "cola", 1).await;
    add(&app, "margherita", 1).await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    cart.remove(&MenuItemId::new("cola")).await;

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].id.as_str(), "margherita");
}

#[tokio::test]
async fn test_full_order_and_payment() {
    let (app, user) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "margherita", 2).await;
    add(&app, "cola", 1).await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    assert_eq!(cart.total(), "24.98");

    let alert = cart.place_order().await.unwrap();
    assert_eq!(alert, Alert::new("Order Complete", "Your order has been placed!"));
    assert!(cart.lines().is_empty());
    assert!(app.store.is_empty(&collections::cart_items(&user.uid)).await);

    let mut orders = OrdersView::new(app.ctx.clone());
    orders.activate().await;
    assert_eq!(orders.orders().len(), 1);
    assert_eq!(orders.orders()[0].total, "24.98");
    assert_eq!(orders.orders()[0].id.short().len(), 8);

    let payment = PaymentView::new(app.ctx.clone());
    payment.activate().await;
    assert_eq!(payment.status().await, Some(PaymentStatus::Pending));

    let alert = payment.pay().await.unwrap();
    assert_eq!(alert, Alert::new("Success", "Payment completed!"));
    assert_eq!(payment.status().await, Some(PaymentStatus::Paid));

    // A fresh view reads the stored record.
    let reloaded = PaymentView::new(app.ctx.clone());
    reloaded.activate().await;
    assert_eq!(reloaded.status().await, Some(PaymentStatus::Paid));
    assert_eq!(app.store.len(&collections::payments(&user.uid)).await, 1);
}

#[tokio::test]
async fn test_empty_cart_order_is_rejected() {
    let (app, _) = TestApp::signed_in().await;
    let writes_before = app.store.write_count().await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    let alert = cart.place_order().await.unwrap();

    assert_eq!(
        alert,
        Alert::new("Empty Cart", "Please add items to the cart before ordering.")
    );
    assert_eq!(app.store.write_count().await, writes_before);
}

#[tokio::test]
async fn test_failed_cart_clear_keeps_order_and_lines() {
    let (app, user) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "margherita", 1).await;

    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    app.store.fail_next(Operation::Commit, 1).await;

    let alert = cart.place_order().await.unwrap();
    assert_eq!(alert, Alert::new("Error", "Could not complete order."));
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(app.store.len(&collections::orders(&user.uid)).await, 1);
    assert_eq!(app.store.len(&collections::cart_items(&user.uid)).await, 1);
}

#[tokio::test]
async fn test_orders_newest_first() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;

    let mut cart = CartView::new(app.ctx.clone());
    add(&app, "cola", 1).await;
    cart.activate().await;
    cart.place_order().await.unwrap();

    add(&app, "diavola", 1).await;
    cart.activate().await;
    cart.place_order().await.unwrap();

    let mut orders = OrdersView::new(app.ctx.clone());
    orders.activate().await;
    let totals: Vec<_> = orders.orders().iter().map(|o| o.total.as_str()).collect();
    assert_eq!(totals, ["11.50", "5.00"]);
    assert!(orders.orders()[0].created_at > orders.orders()[1].created_at);
}

#[tokio::test]
async fn test_payment_failure_alert() {
    let (app, _) = TestApp::signed_in().await;
    app.seed_menu(&sample_menu()).await;
    add(&app, "cola", 1).await;
    let mut cart = CartView::new(app.ctx.clone());
    cart.activate().await;
    cart.place_order().await.unwrap();

    let payment = PaymentView::new(app.ctx.clone());
    payment.activate().await;
    app.store.fail_next(Operation::Add, 1).await;

    let alert = payment.pay().await.unwrap();
    assert_eq!(alert, Alert::new("Error", "Could not process payment."));
    assert_eq!(payment.status().await, Some(PaymentStatus::Pending));
}

#[tokio::test]
async fn test_payment_view_without_orders() {
    let (app, _) = TestApp::signed_in().await;
    let payment = PaymentView::new(app.ctx.clone());
    payment.activate().await;

    assert!(!payment.is_loading().await);
    assert!(payment.latest_order().await.is_none());
    assert!(payment.pay().await.is_none());
}
