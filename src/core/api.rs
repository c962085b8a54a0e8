//! HTTP surface
//!
//! Endpoints:
//! - POST /checkpoint   - full pipeline in one call
//! - POST /mcp          - MCP JSON-RPC over HTTP
//! - GET  /sse          - MCP SSE handshake stream
//! - GET  /health       - liveness and session count
//! - GET  /metrics/json - counters, latency, floor health, ledger state
//! - GET  /openapi.json - machine-readable surface description
//!
//! When ARIFOS_API_KEY is set, /checkpoint, /mcp, /sse and /metrics/json
//! require it via the X-API-Key header or the api_key query parameter;
//! /health and /openapi.json stay public so liveness checks and schema
//! discovery work before auth. Pipeline refusals come back as 200 verdict
//! payloads; only transport-level problems use HTTP error codes.

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use super::mcp;
use super::pipeline::Pipeline;

/// Shared state behind every handler
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
pub struct CheckpointContext {
    #[serde(default)]
    pub evidence_ratio: Option<f64>,
    #[serde(default)]
    pub authority_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckpointRequest {
    pub query: String,
    /// Candidate answer under review; omitted for query-only screening
    #[serde(default)]
    pub draft: Option<String>,
    #[serde(default)]
    pub context: Option<CheckpointContext>,
    #[serde(default)]
    pub stakeholders: Option<Vec<String>>,
}

/// Create the API router
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = Arc::new(AppState { pipeline });
    Router::new()
        .route("/health", get(health))
        .route("/checkpoint", post(checkpoint))
        .route("/mcp", post(mcp_http))
        .route("/sse", get(sse_handshake))
        .route("/metrics/json", get(metrics_json))
        .route("/openapi.json", get(openapi))
        .with_state(state)
}

/// API-key guard for the governed endpoints
fn authorized(state: &AppState, headers: &HeaderMap, params: &HashMap<String, String>) -> bool {
    let expected = match &state.pipeline.config().api_key {
        Some(key) => key,
        None => return true,
    };
    let presented = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| params.get("api_key").map(String::as_str));
    presented == Some(expected.as_str())
}

/// Caller identity for rate-limit buckets: forwarded or peer IP first,
/// then the presented API key, then the session token
fn caller_id(
    headers: &HeaderMap,
    params: &HashMap<String, String>,
    remote: Option<SocketAddr>,
    session_token: Option<&str>,
) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        return forwarded.split(',').next().unwrap_or(forwarded).trim().to_string();
    }
    if let Some(addr) = remote {
        return addr.ip().to_string();
    }
    if let Some(key) = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| params.get("api_key").map(String::as_str))
    {
        return format!("key:{}", key);
    }
    if let Some(token) = session_token {
        return format!("token:{}", token);
    }
    "http".to_string()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.pipeline.metrics_snapshot().await;
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "active_sessions": snapshot.active_sessions,
        "uptime_hours": snapshot.uptime_hours,
    }))
}

/// One-shot governance checkpoint over the full pipeline
async fn checkpoint(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<CheckpointRequest>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&state, &headers, &params) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let caller = caller_id(&headers, &params, connect.map(|c| c.0), None);
    if let Err(refusal) = state.pipeline.check_rate(&caller, "checkpoint").await {
        return Ok(Json(serde_json::to_value(&refusal).unwrap_or_default()));
    }

    let (evidence_ratio, authority_token) = match &req.context {
        Some(ctx) => (ctx.evidence_ratio, ctx.authority_token.clone()),
        None => (None, None),
    };
    let outcome = state
        .pipeline
        .checkpoint(
            &req.query,
            req.draft.as_deref(),
            evidence_ratio,
            authority_token.as_deref(),
        )
        .await;

    Ok(Json(match outcome {
        Ok(outcome) => {
            let mut body = serde_json::to_value(&outcome).unwrap_or_default();
            if let Some(map) = body.as_object_mut() {
                map.insert("atlas_lane".to_string(), json!(outcome.lane));
                map.insert("version".to_string(), json!(crate::VERSION));
                if let Some(stakeholders) = &req.stakeholders {
                    map.insert("stakeholders".to_string(), json!(stakeholders));
                }
            }
            body
        }
        Err(refusal) => serde_json::to_value(&refusal).unwrap_or_default(),
    }))
}

/// MCP over HTTP: one JSON-RPC frame per request body
async fn mcp_http(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(msg): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&state, &headers, &params) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let session_token = msg
        .pointer("/params/arguments/session_token")
        .and_then(Value::as_str);
    let caller = caller_id(&headers, &params, connect.map(|c| c.0), session_token);
    let reply = mcp::handle_message(&state.pipeline, &caller, msg).await;
    // Notifications get an empty accepted body
    Ok(Json(reply.unwrap_or_else(|| json!({}))))
}

/// Legacy SSE handshake: clients connect here, get the message endpoint,
/// then POST frames to /mcp
async fn sse_handshake(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    if !authorized(&state, &headers, &params) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let first = stream::once(async { Ok(Event::default().event("endpoint").data("/mcp")) });
    Ok(Sse::new(first).keep_alive(KeepAlive::default()))
}

async fn metrics_json(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&state, &headers, &params) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let snapshot = state.pipeline.metrics_snapshot().await;
    let ledger = state.pipeline.ledger();
    let mut body = serde_json::to_value(&snapshot).unwrap_or_default();
    if let Some(map) = body.as_object_mut() {
        map.insert(
            "ledger".to_string(),
            json!({
                "entries": ledger.len().await,
                "chain_ok": ledger.verify_chain().await,
            }),
        );
    }
    Ok(Json(body))
}

async fn openapi() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "arbiter0",
            "version": crate::VERSION,
            "description": "Constitutional governance filter: verdict pipeline with a Merkle-sealed audit ledger"
        },
        "paths": {
            "/checkpoint": {
                "post": {
                    "summary": "Run the full governance pipeline over one query",
                    "responses": {"200": {"description": "Verdict payload"}, "401": {"description": "Missing or wrong API key"}}
                }
            },
            "/mcp": {
                "post": {
                    "summary": "MCP JSON-RPC frame",
                    "responses": {"200": {"description": "JSON-RPC reply"}}
                }
            },
            "/sse": {
                "get": {
                    "summary": "MCP SSE handshake",
                    "responses": {"200": {"description": "Event stream"}}
                }
            },
            "/health": {
                "get": {"summary": "Liveness", "responses": {"200": {"description": "Status"}}}
            },
            "/metrics/json": {
                "get": {"summary": "Counters and ledger state", "responses": {"200": {"description": "Metrics snapshot"}}}
            }
        }
    }))
}

/// Run the API server with the background orphan sweeper
pub async fn run_server(pipeline: Arc<Pipeline>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", pipeline.config().port);
    let router = create_router(pipeline.clone());

    Pipeline::spawn_sweeper(pipeline.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "http surface listening");
    println!("arbiter0 API running on {}", addr);
    println!("  POST /checkpoint    - Full governance pipeline");
    println!("  POST /mcp           - MCP JSON-RPC");
    println!("  GET  /sse           - MCP SSE handshake");
    println!("  GET  /health        - Health check");
    println!("  GET  /metrics/json  - Metrics snapshot");
    println!("  GET  /openapi.json  - Surface description");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
