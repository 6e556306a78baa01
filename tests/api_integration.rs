//! HTTP API tests driven through the router with `oneshot`

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use socket_bridge::config::Settings;
use socket_bridge::connection_manager::ConnectionHandle;
use socket_bridge::server::{create_app, AppState};
use socket_bridge::websocket::EventFrame;

fn test_state() -> AppState {
    AppState::new(Settings::default())
}

fn connect(state: &AppState, id: &str) -> mpsc::Receiver<EventFrame> {
    let (tx, rx) = mpsc::channel(16);
    state
        .registry
        .register(Arc::new(ConnectionHandle::new(id, tx)));
    rx
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_emit_direct() {
    let state = test_state();
    let mut a = connect(&state, "A");
    let mut b = connect(&state, "B");
    let app = create_app(state);

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/emit",
            json!({
                "socketIOEvent": "hello",
                "socketIOEmit": "emit",
                "socketIOId": "A",
                "payload": {"text": "hi"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "direct");
    assert_eq!(body["delivered"], 1);

    let frame = tokio_test::assert_ok!(a.try_recv());
    assert_eq!(frame, EventFrame::new("hello", json!({"text": "hi"})));
    tokio_test::assert_err!(b.try_recv());
}

#[tokio::test]
async fn test_emit_without_event_is_rejected() {
    let app = create_app(test_state());

    let (status, body) = send(app, post_json("/api/v1/emit", json!({"payload": 1}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_emit_to_unknown_connection_delivers_nothing() {
    let app = create_app(test_state());

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/emit",
            json!({"socketIOEvent": "x", "socketIOEmit": "emit", "socketIOId": "ghost"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 0);
}

#[tokio::test]
async fn test_join_echoes_and_leave_is_silent() {
    let state = test_state();
    let _a = connect(&state, "A");
    let app = create_app(state.clone());

    let join = json!({"socketIOId": "A", "payload": {"room": "lobby"}, "topic": "kept"});
    let (status, body) = send(app.clone(), post_json("/api/v1/rooms/join", join.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, join);

    let (status, body) = send(app.clone(), get("/api/v1/rooms")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"]["lobby"], json!(["A"]));
    assert_eq!(body["payload"]["A"], json!(["A"]));

    let (status, body) = send(app.clone(), post_json("/api/v1/rooms/leave", join)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(!state.registry.rooms().contains_key("lobby"));
}

#[tokio::test]
async fn test_join_unknown_connection_returns_no_content() {
    let app = create_app(test_state());

    let (status, _) = send(
        app,
        post_json(
            "/api/v1/rooms/join",
            json!({"socketIOId": "ghost", "payload": {"room": "lobby"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_properties_lookup() {
    let state = test_state();
    let _a = connect(&state, "A");
    let app = create_app(state);

    let (status, _) = send(app.clone(), get("/api/v1/connections/A/properties")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/v1/emit",
            json!({
                "socketIOEvent": "welcome",
                "socketIOEmit": "emit",
                "socketIOId": "A",
                "socketIOAddStaticProperties": {"user": "alice"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, get("/api/v1/connections/A/properties")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user": "alice"}));
}

#[tokio::test]
async fn test_property_write_without_event_is_stored() {
    let state = test_state();
    let mut a = connect(&state, "A");
    let app = create_app(state);

    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/v1/emit",
            json!({"socketIOId": "A", "socketIOAddStaticProperties": {"user": "alice"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 0);

    let (status, body) = send(app, get("/api/v1/connections/A/properties")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user": "alice"}));
    tokio_test::assert_err!(a.try_recv());
}

#[tokio::test]
async fn test_list_connections() {
    let state = test_state();
    let _a = connect(&state, "A");
    let _b = connect(&state, "B");
    let app = create_app(state);

    let (status, body) = send(app, get("/api/v1/connections")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let mut settings = Settings::default();
    settings.api.key = Some("secret".to_string());
    let app = create_app(AppState::new(settings));

    let (status, body) = send(app.clone(), get("/api/v1/rooms")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let request = Request::builder()
        .uri("/api/v1/rooms")
        .header("X-API-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    // Service routes stay open
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_app(test_state());

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("socket_bridge_connections_total"));
}
