//! Route table and handlers.

use crate::{ApiError, AppState};
use aibot_rs_core::{
    CoreError, DashboardRow, RequestContext, TurnOutcome, dashboard_rows, session_options,
};
use aibot_rs_protocol::{SessionId, TraceFilter};
use aibot_rs_traces::{TraceError, TraceStore};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}", delete(delete_session))
        .route("/v1/sessions/{id}/turns", post(run_turn))
        .route("/v1/traces", get(list_traces))
        .route("/v1/traces/sessions", get(list_sessions))
        .route("/v1/traces/export", get(export_traces))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: SessionId,
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    prompt: String,
}

#[derive(Debug, Default, Deserialize)]
struct TraceQuery {
    session_id: Option<String>,
    role: Option<String>,
    search: Option<String>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create();
    info!("session created (session_id={session_id})");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(&id) {
        return Err(CoreError::UnknownSession(id).into());
    }
    info!("session removed (session_id={id})");
    Ok(StatusCode::NO_CONTENT)
}

async fn run_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TurnRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| CoreError::UnknownSession(id.clone()))?;
    let request = request_context(&headers);
    let mut session = session.lock().await;
    let outcome = state
        .runner
        .run_turn(&mut session, &body.prompt, &request)
        .await?;
    Ok(Json(outcome))
}

async fn list_traces(
    State(state): State<AppState>,
    Query(query): Query<TraceQuery>,
) -> Result<Json<Vec<DashboardRow>>, ApiError> {
    let filter = TraceFilter::from_selection(
        query.session_id.as_deref(),
        query.role.as_deref(),
        query.search.as_deref(),
    )?;
    let records = with_store(&state, move |store| store.query(&filter)).await?;
    debug!("trace query served (rows={})", records.len());
    Ok(Json(dashboard_rows(&records)))
}

async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let sessions = with_store(&state, |store| store.sessions()).await?;
    Ok(Json(session_options(&sessions)))
}

async fn export_traces(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(bytes) = with_store(&state, |store| store.export()).await? else {
        return Err(ApiError::NotFound("no trace file found yet".to_string()));
    };
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        state.export_filename
    ))
    .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Run a blocking store call off the async workers.
async fn with_store<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn TraceStore) -> Result<T, TraceError> + Send + 'static,
{
    let store: Arc<dyn TraceStore> = state.runner.store().clone();
    let result = tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(result?)
}

/// `User-Agent` plus the first `X-Forwarded-For` hop.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    RequestContext::new(header_text(header::USER_AGENT), client_ip)
}
