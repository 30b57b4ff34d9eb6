use actix_web::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use chrono::DateTime;
use gophermart_engine::{
    db_types::{OrderNumber, OrderStatusType, Points},
    MemoryDatabase,
};
use serde_json::json;

use super::helpers::{get_request, register, send, submit_order_request, test_state, withdraw_request};

#[actix_web::test]
async fn submit_new_and_repeated_orders() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    let bob = register(&state, "bob", "pw").await;

    let reply = send(&state, submit_order_request(&alice, "12345678903")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED, "{}", reply.body);
    // Same user, same number
    let reply = send(&state, submit_order_request(&alice, "12345678903\n")).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    // Someone else's number
    let reply = send(&state, submit_order_request(&bob, "12345678903")).await;
    assert_eq!(reply.status, StatusCode::CONFLICT, "{}", reply.body);
}

#[actix_web::test]
async fn bad_order_numbers_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    for number in ["12345678900", "", "abc", "1234-5678-903"] {
        let reply = send(&state, submit_order_request(&alice, number)).await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY, "order number '{number}'");
    }
    let reply = send(&state, get_request(&alice, "/api/user/orders")).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn orders_must_be_plain_text() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    let req = submit_order_request(&alice, "12345678903").insert_header((CONTENT_TYPE, "application/json"));
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let req = actix_web::test::TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {alice}")))
        .set_payload("12345678903");
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // Parameters on the content type are fine
    let req = submit_order_request(&alice, "12345678903").insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"));
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn anonymous_submissions_are_refused() {
    let state = test_state(MemoryDatabase::new());
    let req = actix_web::test::TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((CONTENT_TYPE, "text/plain"))
        .set_payload("12345678903");
    assert_eq!(send(&state, req).await.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdrawn_numbers_cannot_be_submitted() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    send(&state, submit_order_request(&alice, "79927398713")).await;
    state
        .orders_api
        .reconcile(&OrderNumber::from("79927398713"), OrderStatusType::Processed, Points::from_points(100))
        .await
        .unwrap();
    let reply = send(&state, withdraw_request(&alice, json!({ "order": "2377225624", "sum": 10 }))).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    let reply = send(&state, submit_order_request(&alice, "2377225624")).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn list_orders() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let alice = register(&state, "alice", "pw").await;
    let bob = register(&state, "bob", "pw").await;

    let reply = send(&state, get_request(&alice, "/api/user/orders")).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(reply.body.is_empty());

    for number in ["79927398713", "12345678903", "4561261212345467"] {
        let reply = send(&state, submit_order_request(&alice, number)).await;
        assert_eq!(reply.status, StatusCode::ACCEPTED);
    }
    send(&state, submit_order_request(&bob, "18")).await;
    let api = &state.orders_api;
    api.reconcile(&"79927398713".into(), OrderStatusType::Processed, Points::try_from(729.98).unwrap()).await.unwrap();
    api.reconcile(&"12345678903".into(), OrderStatusType::Invalid, Points::default()).await.unwrap();

    let reply = send(&state, get_request(&alice, "/api/user/orders")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let orders = reply.json();
    let orders = orders.as_array().expect("Expected a JSON array");
    assert_eq!(orders.len(), 3);

    assert_eq!(orders[0]["number"], "79927398713");
    assert_eq!(orders[0]["status"], "PROCESSED");
    assert_eq!(orders[0]["accrual"].as_f64(), Some(729.98));

    assert_eq!(orders[1]["number"], "12345678903");
    assert_eq!(orders[1]["status"], "INVALID");
    assert!(orders[1].get("accrual").is_none());

    assert_eq!(orders[2]["number"], "4561261212345467");
    assert_eq!(orders[2]["status"], "NEW");
    assert!(orders[2].get("accrual").is_none());
    for order in orders {
        let uploaded_at = order["uploaded_at"].as_str().expect("uploaded_at should be a string");
        assert!(DateTime::parse_from_rfc3339(uploaded_at).is_ok(), "{uploaded_at} is not RFC 3339");
    }
}
