use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use momo_ledger::api::{router, AppState};
use momo_ledger::config::parse_users;
use momo_ledger::importer;
use momo_ledger::models::RawMessage;
use momo_ledger::store::TransactionStore;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn state() -> AppState {
    let records = importer::import_all(&[
        RawMessage::new("Withdrawal of 10000 RWF at agent", "x", "10 May 2024"),
        RawMessage::new("Airtime purchase of 500 RWF", "x", "11 May 2024"),
    ]);
    let store = TransactionStore::from_records(records);
    AppState::new(Arc::new(Mutex::new(store)), parse_users("admin:password123,user:userpass"))
}

fn app(state: &AppState) -> Router {
    router(state.clone())
}

fn auth() -> String {
    format!("Basic {}", STANDARD.encode("admin:password123"))
}

async fn call(state: &AppState, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth());
    if body.is_some() {
        req = req.header(header::CONTENT_TYPE, "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let resp = app(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let state = state();
    let req = Request::builder().uri("/transactions").body(Body::empty()).unwrap();
    let resp = app(&state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);

    let bad = format!("Basic {}", STANDARD.encode("admin:wrong"));
    let req = Request::builder()
        .uri("/transactions")
        .header(header::AUTHORIZATION, bad)
        .body(Body::empty())
        .unwrap();
    let resp = app(&state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_does_not_need_credentials() {
    let state = state();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/transactions")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app(&state).oneshot(req).await.unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn list_returns_count_and_records_in_order() {
    let state = state();
    let (status, json) = call(&state, Method::GET, "/transactions", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 2);
    assert_eq!(json["data"][0]["id"], "1");
    assert_eq!(json["data"][0]["type"], "WITHDRAW");
    assert_eq!(json["data"][0]["amount"], 10000.0);
    assert_eq!(json["data"][1]["type"], "AIRTIME");
}

#[tokio::test]
async fn get_known_and_unknown_ids() {
    let state = state();

    let (status, json) = call(&state, Method::GET, "/transactions/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["receiver"], "Airtime");

    let (status, json) = call(&state, Method::GET, "/transactions/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"success": false, "error": "Transaction 99 not found"}));
}

#[tokio::test]
async fn create_then_fetch() {
    let state = state();
    let body = r#"{"type": "DEPOSIT", "amount": 100, "sender": "X", "receiver": "Y"}"#;

    let (status, json) = call(&state, Method::POST, "/transactions", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Transaction created");
    assert_eq!(json["data"]["id"], "3");
    assert_eq!(json["data"]["status"], "pending");
    assert!(json["data"]["timestamp"].as_str().is_some_and(|t| !t.is_empty()));

    let created = json["data"].clone();
    let (status, json) = call(&state, Method::GET, "/transactions/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], created);
}

#[tokio::test]
async fn create_validation_and_malformed_bodies() {
    let state = state();

    let (status, json) = call(&state, Method::POST, "/transactions", Some(r#"{"amount": 100}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing fields: type, sender, receiver");

    let (status, json) = call(&state, Method::POST, "/transactions", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (status, _) = call(
        &state,
        Method::POST,
        "/transactions",
        Some(r#"{"type": "FOO", "amount": 1, "sender": "a", "receiver": "b"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = call(&state, Method::GET, "/transactions", None).await;
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn update_merges_and_keeps_id() {
    let state = state();
    let body = r#"{"id": "500", "status": "reversed", "note": "customer dispute"}"#;

    let (status, json) = call(&state, Method::PUT, "/transactions/1", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Transaction updated");
    assert_eq!(json["data"]["id"], "1");
    assert_eq!(json["data"]["status"], "reversed");
    assert_eq!(json["data"]["note"], "customer dispute");
    assert_eq!(json["data"]["type"], "WITHDRAW");

    let (_, listed) = call(&state, Method::GET, "/transactions", None).await;
    assert_eq!(listed["data"][0], json["data"]);

    let (status, _) = call(&state, Method::PUT, "/transactions/42", Some("{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_not_repeatable() {
    let state = state();

    let (status, json) = call(&state, Method::DELETE, "/transactions/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Transaction 1 deleted");
    assert_eq!(json["data"]["id"], "1");

    let (status, _) = call(&state, Method::DELETE, "/transactions/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&state, Method::GET, "/transactions/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = call(&state, Method::GET, "/transactions", None).await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn unknown_endpoint() {
    let state = state();
    let (status, json) = call(&state, Method::GET, "/accounts", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Endpoint not found");
}
