use actix_web::{
    cookie::Cookie,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        StatusCode,
    },
    test::TestRequest,
};
use gophermart_engine::MemoryDatabase;

use super::helpers::{credentials, get_request, register, send, test_state, user_id};
use crate::auth::AUTH_COOKIE;

#[actix_web::test]
async fn register_issues_a_session() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let token = register(&state, "alice", "correct horse").await;
    assert!(user_id(&token) > 0);
    let reply = send(&state, get_request(&token, "/api/user/balance")).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[actix_web::test]
async fn session_cookie_is_accepted() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let token = register(&state, "alice", "correct horse").await;
    let req = TestRequest::get().uri("/api/user/balance").cookie(Cookie::new(AUTH_COOKIE, token));
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_login_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    register(&state, "alice", "correct horse").await;
    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("alice", "battery staple"));
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(reply.json()["error"].as_str().unwrap().contains("alice"));
}

#[actix_web::test]
async fn malformed_registrations() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let req = TestRequest::post()
        .uri("/api/user/register")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{\"login\": \"alice\", ");
    assert_eq!(send(&state, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(serde_json::json!({ "login": "alice" }));
    assert_eq!(send(&state, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("", "password"));
    assert_eq!(send(&state, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("alice", ""));
    assert_eq!(send(&state, req).await.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let first = register(&state, "alice", "correct horse").await;

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("alice", "correct horse"));
    let reply = send(&state, req).await;
    assert_eq!(reply.status, StatusCode::OK);
    let token = reply.bearer_token().expect("No token in login response");
    assert_eq!(user_id(&token), user_id(&first));
    assert_eq!(reply.json()["success"], true);

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("alice", "wrong horse"));
    assert_eq!(send(&state, req).await.status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("mallory", "correct horse"));
    assert_eq!(send(&state, req).await.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn protected_routes_need_a_valid_session() {
    let _ = env_logger::try_init().ok();
    let state = test_state(MemoryDatabase::new());
    let mut token = register(&state, "alice", "correct horse").await;
    for path in ["/api/user/orders", "/api/user/balance", "/api/user/withdrawals"] {
        let reply = send(&state, get_request("", path)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{path} without a token");
    }
    // Tamper with the signature
    let n = token.len();
    token.replace_range(n - 6..n - 1, "AAAAA");
    let reply = send(&state, get_request(&token, "/api/user/balance")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/api/user/balance").insert_header((AUTHORIZATION, "Bearer not-a-token"));
    assert_eq!(send(&state, req).await.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_check() {
    let state = test_state(MemoryDatabase::new());
    let reply = send(&state, TestRequest::get().uri("/health")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "👍️\n");
}
