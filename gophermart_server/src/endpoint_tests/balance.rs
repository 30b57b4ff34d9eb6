use actix_web::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        StatusCode,
    },
    test::TestRequest,
};
use gophermart_engine::{
    db_types::{OrderStatusType, Points},
    MemoryDatabase,
};
use serde_json::json;

use super::helpers::{get_request, register, send, submit_order_request, test_state, withdraw_request};
use crate::server::AppState;

/// Registers alice and credits her with 500 points from a processed order.
async fn funded_user(state: &AppState<MemoryDatabase>) -> String {
    let alice = register(state, "alice", "pw").await;
    let reply = send(state, submit_order_request(&alice, "79927398713")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
    state
        .orders_api
        .reconcile(&"79927398713".into(), OrderStatusType::Processed, Points::from_points(500))
        .await
        .unwrap();
    alice
}

async fn balance(state: &AppState<MemoryDatabase>, token: &str) -> (f64, f64) {
    let reply = send(state, get_request(token, "/api/user/balance")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let json = reply.json();
    (json["current"].as_f64().unwrap(), json["withdrawn"].as_f64().unwrap())
}

#[actix_web::test]
async fn fresh_accounts_are_empty() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    assert_eq!(balance(&state, &alice).await, (0.0, 0.0));
    let reply = send(&state, get_request(&alice, "/api/user/withdrawals")).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn pending_accruals_do_not_count() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = funded_user(&state).await;
    send(&state, submit_order_request(&alice, "12345678903")).await;
    state.orders_api.reconcile(&"12345678903".into(), OrderStatusType::Processing, Points::default()).await.unwrap();
    assert_eq!(balance(&state, &alice).await, (500.0, 0.0));
}

#[actix_web::test]
async fn withdraw_and_list() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = funded_user(&state).await;

    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 251.5 }))).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(balance(&state, &alice).await, (248.5, 251.5));

    let reply = send(&state, withdraw_request(&alice, json!({ "order": "18", "sum": 48.5 }))).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(balance(&state, &alice).await, (200.0, 300.0));

    let reply = send(&state, get_request(&alice, "/api/user/withdrawals")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let withdrawals = reply.json();
    let withdrawals = withdrawals.as_array().expect("Expected a JSON array");
    assert_eq!(withdrawals.len(), 2);
    assert_eq!(withdrawals[0]["order"], "2377225624");
    assert_eq!(withdrawals[0]["sum"].as_f64(), Some(251.5));
    assert!(withdrawals[0]["processed_at"].is_string());
    assert_eq!(withdrawals[1]["order"], "18");
    assert_eq!(withdrawals[1]["sum"].as_f64(), Some(48.5));
}

#[actix_web::test]
async fn overdrafts_are_refused() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = funded_user(&state).await;
    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 500.01 }))).await;
    assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(balance(&state, &alice).await, (500.0, 0.0));
    // The number was not used up by the failed attempt
    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 500 }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(balance(&state, &alice).await, (0.0, 500.0));
}

#[actix_web::test]
async fn bad_withdrawals() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = funded_user(&state).await;
    let unprocessable = [
        // Luhn failure
        json!({ "order": "2377225625", "sum": 1 }),
        // Non-positive amounts
        json!({ "order": "2377225624", "sum": 0 }),
        json!({ "order": "2377225624", "sum": -5 }),
        // A number that already carries an accrual
        json!({ "order": "79927398713", "sum": 1 }),
    ];
    for body in unprocessable {
        let reply = send(&state, withdraw_request(&alice, body.clone())).await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY, "{body}: {}", reply.body);
    }
    // Malformed JSON
    let req = TestRequest::post()
        .uri("/api/user/balance/withdraw")
        .insert_header((AUTHORIZATION, format!("Bearer {alice}")))
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{\"order\": \"2377225624\", \"sum\": \"lots\"}");
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);

    assert_eq!(balance(&state, &alice).await, (500.0, 0.0));
    let reply = send(&state, get_request(&alice, "/api/user/withdrawals")).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn reused_withdrawal_numbers_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = funded_user(&state).await;
    let bob = register(&state, "bob", "pw").await;
    let reply = send(&state, submit_order_request(&bob, "12345678903")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);

    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 100 }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 100 }))).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    // Bob's order number is taken too
    let reply = send(&state, withdraw_request(&alice, json!({ "order": "12345678903", "sum": 100 }))).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(balance(&state, &alice).await, (400.0, 100.0));
}
