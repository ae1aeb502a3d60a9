use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use clap::Parser;
use mockstack_router::{app, AppState, Config};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (axum::Router, AppState) {
    let config = Config::try_parse_from([
        "mockstack-router",
        "--service",
        "hello,echo,counter",
        "--base-uri",
        "http://mock.test/",
    ])
    .expect("config");
    let state = AppState {
        router: Arc::new(config.build_router().expect("router")),
        max_body_bytes: 1024,
    };
    (app(state.clone()), state)
}

async fn call(app: &axum::Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("response")
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn admin(method: &str, session_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/admin/");
    if let Some(id) = session_id {
        builder = builder.header("x-session-id", id);
    }
    builder.body(Body::empty()).expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn test_health() {
    let (app, state) = test_app();
    state.router.registry().create_session(Some("s1")).unwrap();

    let resp = call(&app, get("/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn test_create_then_call_session() {
    let (app, _state) = test_app();

    let resp = call(&app, admin("POST", Some("s1"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()["x-session-id"], "s1");
    assert_eq!(resp.headers()["location"], "http://mock.test/s1/");

    let resp = call(&app, get("/s1/hello/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Hello");
}

#[tokio::test]
async fn test_request_body_and_method_reach_the_service() {
    let (app, _state) = test_app();
    call(&app, admin("POST", Some("s1"))).await;

    let req = Request::builder()
        .method("PATCH")
        .uri("/s1/echo/items/7?verbose=1")
        .body(Body::from("payload"))
        .expect("request");
    let resp = call(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-echo-method"], "PATCH");
    assert_eq!(resp.headers()["x-echo-path"], "/items/7");
    assert_eq!(body_text(resp).await, "payload");
}

#[tokio::test]
async fn test_reference_status_codes() {
    let (app, _state) = test_app();

    let resp = call(&app, get("/")).await;
    assert_eq!(resp.status().as_u16(), 593);
    assert_eq!(body_json(resp).await["code"], "MISSING_SESSION");

    let resp = call(&app, get("/nobody/hello/")).await;
    assert_eq!(resp.status().as_u16(), 594);
    assert_eq!(body_json(resp).await["code"], "UNKNOWN_SESSION");
}

#[tokio::test]
async fn test_admin_lifecycle() {
    let (app, _state) = test_app();

    let resp = call(&app, admin("POST", None)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session_id = resp.headers()["x-session-id"]
        .to_str()
        .expect("ascii id")
        .to_string();

    let resp = call(&app, get("/admin/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "base_url": "http://mock.test",
            "services": {
                "counter": "CounterService",
                "echo": "EchoService",
                "hello": "HelloService",
            },
            "sessions": [session_id.clone()],
        })
    );

    let resp = call(&app, admin("PUT", Some(&session_id))).await;
    assert_eq!(resp.status(), StatusCode::RESET_CONTENT);

    let resp = call(&app, admin("DELETE", Some(&session_id))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = call(&app, admin("DELETE", Some(&session_id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&app, admin("PUT", Some(&session_id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&app, get(&format!("/{}/hello/", session_id))).await;
    assert_eq!(resp.status().as_u16(), 594);
}

#[tokio::test]
async fn test_session_detail() {
    let (app, _state) = test_app();
    call(&app, admin("POST", Some("s1"))).await;
    call(&app, get("/s1/hello/")).await;
    call(&app, get("/s1/echo/status/404")).await;

    let resp = call(&app, get("/admin/s1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session_valid"], true);
    assert_eq!(body["accessed-count"], 2);
    assert_eq!(body["status"], json!({"200": 1, "404": 1}));
    assert!(body["created-time"].is_string());
    assert!(body["accessed-time"].is_string());

    let resp = call(&app, get("/admin/unknown-id")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session_valid"], false);
    assert_eq!(body["created-time"], Value::Null);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, _state) = test_app();
    call(&app, admin("POST", Some("s1"))).await;

    let req = Request::builder()
        .method("POST")
        .uri("/s1/echo/")
        .body(Body::from(vec![b'x'; 4096]))
        .expect("request");
    let resp = call(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "INVALID_BODY");
}
