use aibot_rs_core::TurnRunner;
use aibot_rs_server::{AppState, router};
use aibot_rs_test_utils::{FailingTraceStore, StubLLM};
use aibot_rs_traces::{JsonTraceStore, TraceStore};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

struct Harness {
    temp: TempDir,
    app: Router,
}

fn harness() -> Harness {
    let temp = tempdir().expect("tempdir");
    let store: Arc<dyn TraceStore> =
        Arc::new(JsonTraceStore::open(temp.path().join("local_traces.json")).expect("store"));
    let runner = TurnRunner::builder(Arc::new(StubLLM::replying("hello back")), store).build();
    Harness {
        temp,
        app: router(AppState::new(Arc::new(runner), "local_traces.json")),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "curl/8.4.0")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn create_session(app: &Router) -> String {
    let response = send(app, post_json("/v1/sessions", json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["session_id"]
        .as_str()
        .expect("session id")
        .to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = harness();
    let response = send(&harness.app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn turns_are_logged_and_queryable() {
    let harness = harness();
    let session_id = create_session(&harness.app).await;

    let response = send(
        &harness.app,
        post_json(
            &format!("/v1/sessions/{session_id}/turns"),
            json!({ "prompt": "hi there" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["turn"], json!(1));
    assert_eq!(outcome["response"], json!("AI Response:\nhello back"));
    let trace_id = outcome["trace_id"].as_str().expect("trace id").to_string();

    let rows = body_json(send(&harness.app, get("/v1/traces")).await).await;
    let rows = rows.as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["role"], json!("user"));
    assert_eq!(rows[1]["role"], json!("assistant"));
    assert_eq!(rows[0]["trace_id"], json!(trace_id));
    assert_eq!(rows[0]["metadata"]["session_id"], json!(session_id));
    assert_eq!(rows[0]["metadata"]["device"], json!("unknown"));

    let assistant = body_json(send(&harness.app, get("/v1/traces?role=assistant&session_id=All")).await).await;
    assert_eq!(assistant.as_array().map(Vec::len), Some(1));

    let search = body_json(send(&harness.app, get("/v1/traces?search=HI%20THERE")).await).await;
    assert_eq!(search.as_array().map(Vec::len), Some(1));

    let sessions = body_json(send(&harness.app, get("/v1/traces/sessions")).await).await;
    assert_eq!(sessions, json!(["All", session_id]));
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn deleted_session_is_gone_but_its_traces_remain() {
    let harness = harness();
    let session_id = create_session(&harness.app).await;
    let turn_uri = format!("/v1/sessions/{session_id}/turns");
    let response = send(&harness.app, post_json(&turn_uri, json!({ "prompt": "hi" }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&harness.app, delete(&format!("/v1/sessions/{session_id}"))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&harness.app, post_json(&turn_uri, json!({ "prompt": "again" }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&harness.app, delete(&format!("/v1/sessions/{session_id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let rows = body_json(send(&harness.app, get("/v1/traces")).await).await;
    assert_eq!(rows.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let harness = harness();
    let response = send(
        &harness.app,
        post_json("/v1/sessions/missing/turns", json!({ "prompt": "hi" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("unknown session: missing"));
}

#[tokio::test]
async fn blank_prompt_is_rejected() {
    let harness = harness();
    let session_id = create_session(&harness.app).await;
    let response = send(
        &harness.app,
        post_json(
            &format!("/v1/sessions/{session_id}/turns"),
            json!({ "prompt": "   " }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_role_filter_is_bad_request() {
    let harness = harness();
    let response = send(&harness.app, get("/v1/traces?role=system")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        json!("unknown role: system")
    );
}

#[tokio::test]
async fn export_is_not_found_before_first_turn() {
    let harness = harness();
    let response = send(&harness.app, get("/v1/traces/export")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_serves_raw_file_as_attachment() {
    let harness = harness();
    let session_id = create_session(&harness.app).await;
    send(
        &harness.app,
        post_json(
            &format!("/v1/sessions/{session_id}/turns"),
            json!({ "prompt": "save me" }),
        ),
    )
    .await;

    let response = send(&harness.app, get("/v1/traces/export")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"local_traces.json\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let on_disk = std::fs::read(harness.temp.path().join("local_traces.json")).expect("file");
    assert_eq!(bytes.to_vec(), on_disk);
}

#[tokio::test]
async fn persistence_failure_is_internal_error() {
    let runner = TurnRunner::builder(
        Arc::new(StubLLM::replying("unused")),
        Arc::new(FailingTraceStore::new()),
    )
    .build();
    let app = router(AppState::new(Arc::new(runner), "local_traces.json"));
    let session_id = create_session(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/v1/sessions/{session_id}/turns"),
            json!({ "prompt": "hi" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error text")
            .starts_with("failed to persist turn")
    );
}
