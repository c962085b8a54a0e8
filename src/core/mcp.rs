//! MCP transport: JSON-RPC 2.0 over stdio (and reused by POST /mcp)
//!
//! Methods:
//! - initialize              - protocol handshake
//! - tools/list              - the five pipeline tools
//! - tools/call              - dispatch into the pipeline
//! - ping                    - liveness
//!
//! Tool failures are verdict payloads inside a successful JSON-RPC reply;
//! JSON-RPC errors are reserved for malformed frames and unknown methods.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::pipeline::Pipeline;
use crate::types::Stage;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Tool descriptors served by tools/list
pub fn tool_catalog() -> Value {
    json!([
        {
            "name": Stage::Init.tool_name(),
            "description": "Open a governance session: classify the query into a lane, derive stakes, return a session token",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "authority_token": {"type": "string"}
                },
                "required": ["query"]
            }
        },
        {
            "name": Stage::Reason.tool_name(),
            "description": "Reason stage: score truth, clarity, humility, ontology, injection and curiosity floors over the query and draft",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string"},
                    "session_token": {"type": "string"},
                    "query": {"type": "string"},
                    "draft": {"type": "string"},
                    "evidence_ratio": {"type": "number"}
                },
                "required": ["session_id", "session_token"]
            }
        },
        {
            "name": Stage::Evaluate.tool_name(),
            "description": "Evaluate stage: score reversibility, tri-witness, peace, empathy, anti-hantu and command-authority floors over the text under review",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string"},
                    "session_token": {"type": "string"},
                    "text": {"type": "string"},
                    "stakeholders": {"type": "array", "items": {"type": "string"}},
                    "evidence_ratio": {"type": "number"}
                },
                "required": ["session_id", "session_token"]
            }
        },
        {
            "name": Stage::Decide.tool_name(),
            "description": "Decide stage: derive genius, compute p_truth and resolve APPROVE / CONDITIONAL / REJECT / ESCALATE",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string"},
                    "session_token": {"type": "string"},
                    "evidence_ratio": {"type": "number"}
                },
                "required": ["session_id", "session_token"]
            }
        },
        {
            "name": Stage::Seal.tool_name(),
            "description": "Seal stage: write the Merkle-sealed ledger entry and close the session; action=propose records a sovereign governance proposal",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string"},
                    "session_token": {"type": "string"},
                    "action": {"type": "string", "enum": ["seal", "propose"]},
                    "proposal": {"type": "string"},
                    "authority_token": {"type": "string"}
                }
            }
        }
    ])
}

/// Handle one JSON-RPC message. Notifications return None.
pub async fn handle_message(pipeline: &Pipeline, caller: &str, msg: Value) -> Option<Value> {
    let id = msg.get("id").cloned();
    let method = match msg.get("method").and_then(Value::as_str) {
        Some(m) => m,
        None => {
            return id.map(|id| error_reply(id, INVALID_REQUEST, "missing method"));
        }
    };

    // Notifications carry no id and get no reply
    let id = match id {
        Some(id) => id,
        None => return None,
    };

    match method {
        "initialize" => Some(result_reply(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "arbiter0", "version": crate::VERSION}
            }),
        )),
        "ping" => Some(result_reply(id, json!({}))),
        "tools/list" => Some(result_reply(id, json!({"tools": tool_catalog()}))),
        "tools/call" => {
            let params = msg.get("params").cloned().unwrap_or_else(|| json!({}));
            let name = match params.get("name").and_then(Value::as_str) {
                Some(n) => n.to_string(),
                None => return Some(error_reply(id, INVALID_PARAMS, "missing tool name")),
            };
            let args = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            let body = pipeline.dispatch(caller, &name, args).await;
            let text = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
            Some(result_reply(
                id,
                json!({"content": [{"type": "text", "text": text}]}),
            ))
        }
        other => Some(error_reply(
            id,
            METHOD_NOT_FOUND,
            &format!("unknown method {}", other),
        )),
    }
}

fn result_reply(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn error_reply(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

/// Serve MCP over stdin/stdout, one JSON-RPC frame per line
pub async fn run_stdio(pipeline: Arc<Pipeline>) -> std::io::Result<()> {
    Pipeline::spawn_sweeper(pipeline.clone());

    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    tracing::info!("mcp stdio transport ready");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Value>(&line) {
            Ok(msg) => handle_message(&pipeline, "stdio", msg).await,
            Err(e) => Some(error_reply(Value::Null, PARSE_ERROR, &e.to_string())),
        };
        if let Some(reply) = reply {
            let mut out = serde_json::to_string(&reply).unwrap_or_else(|_| "{}".to_string());
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
