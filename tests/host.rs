mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use capability_agent::capabilities::adapter::adapt_tools;
use capability_agent::capabilities::twitter::CreateSummaryDocument;
use capability_agent::capabilities::CapabilitySet;
use capability_agent::host::{build_router, CapabilityHost, HostConfig, HostState};

use common::StaticTool;

fn capability_set() -> CapabilitySet {
    CapabilitySet::builder()
        .extend(adapt_tools(vec![StaticTool::echo("transfer")]))
        .add(Arc::new(CreateSummaryDocument))
        .build()
        .unwrap()
}

fn router(auth_token: Option<&str>) -> axum::Router {
    build_router(HostState {
        capabilities: capability_set(),
        auth_token: auth_token.map(str::to_string),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_tool(name: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/tools/{name}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_capability_count() {
    let response = router(None)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["capabilities"], json!(2));
    assert!(body["version"].as_str().unwrap().starts_with(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn capabilities_are_listed_with_schemas() {
    let response = router(None)
        .oneshot(Request::builder().uri("/capabilities").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], json!("transfer"));
    assert_eq!(body[1]["name"], json!("createSummaryDocument"));
    assert_eq!(body[1]["schema"]["required"], json!(["content"]));
}

#[tokio::test]
async fn run_applies_schema_defaults() {
    let response = router(None)
        .oneshot(post_tool(
            "createSummaryDocument",
            json!({"args": {"title": "Weekly", "content": "all green"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"], json!("# Weekly\n\nall green"));
}

#[tokio::test]
async fn run_rejects_schema_violations() {
    let response = router(None)
        .oneshot(post_tool(
            "createSummaryDocument",
            json!({"args": {"format": "pdf"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("content"), "{error}");
    assert!(error.contains("format"), "{error}");
}

#[tokio::test]
async fn unknown_capability_is_not_found() {
    let response = router(None)
        .oneshot(post_tool("nope", json!({"args": {}})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn workspace_action_is_accepted() {
    let response = router(None)
        .oneshot(post_tool(
            "transfer",
            json!({
                "args": {"to": "x", "amount": "1"},
                "action": {"type": "do-task", "workspace": {"id": 7}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await["result"].as_str().unwrap().to_string();
    let echoed: Value = serde_json::from_str(&result).unwrap();
    assert_eq!(echoed, json!({"to": "x", "amount": "1"}));
}

#[tokio::test]
async fn token_is_required_when_configured() {
    let app = router(Some("secret"));

    let denied = app
        .clone()
        .oneshot(Request::builder().uri("/capabilities").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let bearer = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/capabilities")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bearer.status(), StatusCode::OK);

    let api_key = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/capabilities")
                .header("x-api-key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(api_key.status(), StatusCode::OK);

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn host_serves_until_shutdown() {
    let host = CapabilityHost::new(
        HostConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            auth_token: None,
        },
        capability_set(),
    );
    assert_eq!(host.capabilities().len(), 2);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(host.start_with_shutdown(async move {
        let _ = rx.await;
    }));
    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
