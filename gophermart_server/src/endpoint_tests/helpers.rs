use std::time::Duration;

use actix_web::{
    http::{
        header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, SET_COOKIE},
        StatusCode,
    },
    test,
    test::TestRequest,
    App,
};
use gm_common::Secret;
use gophermart_engine::{events::EventProducers, MemoryDatabase};
use log::debug;
use serde_json::{json, Value};

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    server::{configure_app, AppState},
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        signing_key: Secret::new("dTn6eTDTNWmSgk6rKcFNpRrrxw3Lqjy8QBVmghUgVk4nNfWU".to_string()),
        token_ttl: Duration::from_secs(600),
    }
}

pub fn test_state(db: MemoryDatabase) -> AppState<MemoryDatabase> {
    AppState::new(db, EventProducers::default(), TokenIssuer::new(&get_auth_config()))
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn bearer_token(&self) -> Option<String> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {}", self.body))
    }
}

pub async fn send(state: &AppState<MemoryDatabase>, req: TestRequest) -> Reply {
    let app = test::init_service(App::new().configure(configure_app(state.clone()))).await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body).into_owned();
    debug!("Response: {status} {body}");
    Reply { status, headers, body }
}

pub fn credentials(login: &str, password: &str) -> Value {
    json!({ "login": login, "password": password })
}

/// Registers a user and returns their session token.
pub async fn register(state: &AppState<MemoryDatabase>, login: &str, password: &str) -> String {
    let req = TestRequest::post().uri("/api/user/register").set_json(credentials(login, password));
    let reply = send(state, req).await;
    assert_eq!(reply.status, StatusCode::OK, "Registration failed: {}", reply.body);
    assert!(reply.headers.get(SET_COOKIE).is_some(), "No session cookie was set");
    reply.bearer_token().expect("No bearer token in the registration response")
}

pub fn submit_order_request(token: &str, order_number: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .insert_header((CONTENT_TYPE, "text/plain"))
        .set_payload(order_number.to_string())
}

pub fn get_request(token: &str, path: &str) -> TestRequest {
    let req = TestRequest::get().uri(path);
    if token.is_empty() {
        req
    } else {
        req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }
}

pub fn withdraw_request(token: &str, body: Value) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/balance/withdraw")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .set_json(body)
}

/// The id a session token was issued for.
pub fn user_id(token: &str) -> i64 {
    TokenIssuer::new(&get_auth_config()).validate_token(token).expect("Token is not valid")
}
