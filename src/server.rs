use crate::config::{ProviderConfig, TransportConfig};
use crate::error::{AnalyzerError, Result};
use crate::logging::{JournalEntry, SharedJournal};
use crate::proxy;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    /// Kept loose so a non-string transcript is "missing", not a parse error.
    transcript: Option<Value>,
}

pub const TRANSCRIPT_MISSING: &str = "Transcript missing.";
const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_JOURNAL_LIMIT: usize = 50;

pub struct AppState {
    pub provider: ProviderConfig,
    /// `None` when the provider's key env var was unset at start-up.
    pub api_key: Option<String>,
    pub transport: TransportConfig,
    pub client: reqwest::Client,
    pub journal: SharedJournal,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/analyze",
            post(handle_analyze).fallback(handle_method_not_allowed),
        )
        .route("/health", get(handle_health))
        .route("/api/journal", get(handle_journal))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_analyze(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let mut entry = JournalEntry::new(request_id, &state.provider.name, &state.provider.model);

    let result = match parse_transcript(&body) {
        Ok(transcript) => {
            entry.transcript_chars = transcript.chars().count();
            info!(%request_id, chars = entry.transcript_chars, "Analyzing transcript");

            let outcome = proxy::analyze(
                &transcript,
                &state.provider,
                state.api_key.as_deref(),
                &state.client,
                &state.transport,
            )
            .await;
            entry.http_status = outcome.provider_status;
            outcome.result
        }
        Err(e) => Err(e),
    };

    entry.latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    entry.outcome = match result {
        Ok(_) => "success".to_string(),
        Err(ref e) => e.kind().to_string(),
    };
    info!(
        %request_id,
        outcome = %entry.outcome,
        latency_ms = entry.latency_ms,
        "Analysis finished"
    );
    state.journal.record(entry);

    let (status, payload) = match result {
        Ok(text) => (StatusCode::OK, json!({ "result": text })),
        Err(e) => error_payload(&e),
    };

    (
        status,
        [(REQUEST_ID_HEADER, request_id.to_string())],
        Json(payload),
    )
        .into_response()
}

/// Map an error to the caller-facing status and JSON body.
/// Validation errors use `error`; everything else uses `result` so the form can show it.
fn error_payload(err: &AnalyzerError) -> (StatusCode, Value) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match err {
        AnalyzerError::Validation { message } => json!({ "error": message }),
        other => json!({ "result": other.to_string() }),
    };
    (status, body)
}

/// Pull a non-blank `transcript` string out of a JSON request body.
fn parse_transcript(body: &[u8]) -> Result<String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalyzerError::validation(TRANSCRIPT_MISSING));
    }

    let request: AnalyzeRequest = serde_json::from_slice(body)
        .map_err(|e| AnalyzerError::validation(format!("Invalid request body: {}", e)))?;

    match request.transcript {
        Some(Value::String(t)) if !t.trim().is_empty() => Ok(t),
        _ => Err(AnalyzerError::validation(TRANSCRIPT_MISSING)),
    }
}

async fn handle_method_not_allowed(State(state): State<Arc<AppState>>) -> Response {
    let request_id = Uuid::new_v4();
    let mut entry = JournalEntry::new(request_id, &state.provider.name, &state.provider.model);
    entry.outcome = "validation".to_string();
    state.journal.record(entry);

    (
        StatusCode::METHOD_NOT_ALLOWED,
        [
            ("allow", "POST".to_string()),
            (REQUEST_ID_HEADER, request_id.to_string()),
        ],
        Json(json!({ "error": "Method Not Allowed" })),
    )
        .into_response()
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.provider.name,
    }))
}

#[derive(Debug, Deserialize)]
struct JournalQuery {
    limit: Option<usize>,
}

async fn handle_journal(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JournalQuery>,
) -> Json<Value> {
    let entries = state
        .journal
        .recent(query.limit.unwrap_or(DEFAULT_JOURNAL_LIMIT));
    Json(json!({ "entries": entries }))
}
