//! Orders travel from the HTTP API through the event hook and the worker pool to a mock accrual service, and the
//! verdicts show up in the user's balance.
use std::{sync::Arc, time::Duration};

use accrual_tools::{AccrualApi, AccrualConfig};
use actix_web::http::StatusCode;
use gophermart_engine::{
    events::EventHandlers,
    reconciliation::{OrderQueue, ReconciliationConfig, ReconciliationHandle, ReconciliationWorker},
    MemoryDatabase,
};
use httpmock::{Method::GET, MockServer};
use serde_json::{json, Value};

use super::helpers::{get_auth_config, get_request, register, send, submit_order_request};
use crate::{
    auth::TokenIssuer,
    server::{create_event_hooks, AppState},
};

fn fast_config() -> ReconciliationConfig {
    ReconciliationConfig {
        workers: 2,
        // Only the eager path should be needed
        sweep_interval: Duration::from_secs(3600),
        max_attempts: 5,
        poll_interval: Duration::from_millis(20),
        queue_capacity: 16,
    }
}

/// Wires the application the way `serve` does, minus the HTTP listener.
fn start_system(accrual_url: &str) -> (AppState<MemoryDatabase>, ReconciliationHandle) {
    let config = fast_config();
    let queue = OrderQueue::new(config.queue_capacity);
    let handlers = EventHandlers::new(16, create_event_hooks(queue.clone()));
    let producers = handlers.producers();
    handlers.start_handlers();
    let state = AppState::new(MemoryDatabase::new(), producers, TokenIssuer::new(&get_auth_config()));
    let accrual = AccrualApi::new(AccrualConfig::new(accrual_url)).unwrap();
    let handle = ReconciliationWorker::new(Arc::clone(&state.orders_api), accrual, queue, config).start();
    (state, handle)
}

async fn wait_for<F: Fn(&Value) -> bool>(state: &AppState<MemoryDatabase>, token: &str, path: &str, done: F) -> Value {
    for _ in 0..100 {
        let reply = send(state, get_request(token, path)).await;
        if reply.status == StatusCode::OK {
            let json = reply.json();
            if done(&json) {
                return json;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{path} never reached the expected state");
}

#[actix_web::test]
async fn accruals_reach_the_balance() {
    let _ = env_logger::try_init().ok();
    let server = MockServer::start_async().await;
    let processed = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders/12345678903");
            then.status(200).json_body(json!({ "order": "12345678903", "status": "PROCESSED", "accrual": 500 }));
        })
        .await;
    let invalid = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders/79927398713");
            then.status(200).json_body(json!({ "order": "79927398713", "status": "INVALID" }));
        })
        .await;

    let (state, handle) = start_system(&server.base_url());
    let alice = register(&state, "alice", "pw").await;
    let bob = register(&state, "bob", "pw").await;

    let reply = send(&state, submit_order_request(&alice, "12345678903")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
    let reply = send(&state, submit_order_request(&bob, "12345678903")).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    let reply = send(&state, submit_order_request(&alice, "79927398713")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);

    let balance = wait_for(&state, &alice, "/api/user/balance", |b| b["current"].as_f64() == Some(500.0)).await;
    assert_eq!(balance["withdrawn"].as_f64(), Some(0.0));
    let orders = wait_for(&state, &alice, "/api/user/orders", |orders| {
        orders.as_array().map_or(false, |o| o.iter().all(|o| o["status"] == "PROCESSED" || o["status"] == "INVALID"))
    })
    .await;
    assert_eq!(orders[0]["number"], "12345678903");
    assert_eq!(orders[0]["accrual"].as_f64(), Some(500.0));
    assert_eq!(orders[1]["status"], "INVALID");

    handle.shutdown().await;
    // Terminal verdicts are not asked for again
    assert_eq!(processed.hits_async().await, 1);
    assert_eq!(invalid.hits_async().await, 1);

    let reply = send(&state, get_request(&bob, "/api/user/balance")).await;
    assert_eq!(reply.json()["current"].as_f64(), Some(0.0));
}

#[actix_web::test]
async fn unregistered_orders_stay_pending() {
    let _ = env_logger::try_init().ok();
    let server = MockServer::start_async().await;
    let unknown = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders/4561261212345467");
            then.status(204);
        })
        .await;

    let (state, handle) = start_system(&server.base_url());
    let alice = register(&state, "alice", "pw").await;
    let reply = send(&state, submit_order_request(&alice, "4561261212345467")).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);

    for _ in 0..100 {
        if unknown.hits_async().await > 0 && handle.queue().in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.shutdown().await;
    // A 204 ends the cycle at once, and the order waits for the next sweep
    assert_eq!(unknown.hits_async().await, 1);
    let reply = send(&state, get_request(&alice, "/api/user/orders")).await;
    assert_eq!(reply.json()[0]["status"], "NEW");
}
