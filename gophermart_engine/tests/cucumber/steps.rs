use std::str::FromStr;

use cucumber::{then, when};
use gophermart_engine::{
    db_types::{OrderStatusType, Points},
    LedgerManagement,
};

use crate::cucumber::GophermartWorld;

fn points(value: f64) -> Points {
    Points::try_from(value).expect("Not a valid amount of points")
}

#[when(expr = "{word} submits order {word}")]
async fn submit_order(world: &mut GophermartWorld, name: String, order_number: String) {
    let user_id = world.user_id(&name);
    let result = world.api().submit_order(user_id, &order_number).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "{word} withdraws {float} points against order {word}")]
async fn withdraw(world: &mut GophermartWorld, name: String, amount: f64, order_number: String) {
    let user_id = world.user_id(&name);
    let result = world.api().withdraw(user_id, &order_number, points(amount)).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "the accrual service reports order {word} as {word}")]
async fn report_status(world: &mut GophermartWorld, order_number: String, status: String) {
    let status = OrderStatusType::from_str(&status).expect("Not a valid order status");
    world.api().reconcile(&order_number.into(), status, Points::default()).await.expect("Error reconciling order");
}

#[when(expr = "the accrual service reports order {word} as PROCESSED with {float} points")]
async fn report_processed(world: &mut GophermartWorld, order_number: String, amount: f64) {
    world
        .api()
        .reconcile(&order_number.into(), OrderStatusType::Processed, points(amount))
        .await
        .expect("Error reconciling order");
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut GophermartWorld) {
    assert!(world.last_error.is_none(), "Request failed: {:?}", world.last_error);
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut GophermartWorld, message: String) {
    let error = world.last_error.as_ref().expect("The request did not fail");
    assert!(error.contains(&message), "Expected an error containing '{message}', got '{error}'");
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut GophermartWorld, order_number: String, status: String) {
    let expected = OrderStatusType::from_str(&status).expect("Not a valid order status");
    let entry = world
        .api()
        .db()
        .fetch_entry_by_order_number(&order_number.clone().into())
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {order_number} does not exist"));
    assert_eq!(entry.status, expected, "Order {order_number} has the wrong status");
}

#[then(expr = "order {word} belongs to {word}")]
async fn check_owner(world: &mut GophermartWorld, order_number: String, name: String) {
    let entry = world
        .api()
        .db()
        .fetch_entry_by_order_number(&order_number.clone().into())
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {order_number} does not exist"));
    assert_eq!(entry.user_id, world.user_id(&name), "Order {order_number} has the wrong owner");
}

#[then(expr = "{word} has a current balance of {float} points")]
async fn check_current_balance(world: &mut GophermartWorld, name: String, amount: f64) {
    let balance = world.api().db().balance(world.user_id(&name)).await.expect("Error fetching balance");
    assert_eq!(balance.current, points(amount), "Current balance is incorrect");
}

#[then(expr = "{word} has withdrawn {float} points")]
async fn check_withdrawn(world: &mut GophermartWorld, name: String, amount: f64) {
    let balance = world.api().db().balance(world.user_id(&name)).await.expect("Error fetching balance");
    assert_eq!(balance.withdrawn, points(amount), "Withdrawn total is incorrect");
}

#[then(expr = "{word} has {int} pending order(s)")]
async fn check_pending(world: &mut GophermartWorld, name: String, count: usize) {
    let pending = world.api().list_pending_by_user(world.user_id(&name)).await.expect("Error fetching orders");
    assert_eq!(pending.len(), count, "Wrong number of pending orders");
}
