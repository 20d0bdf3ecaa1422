//! Line-delimited JSON-RPC 2.0 tool host.
//!
//! Reads one message per line, answers `initialize`, `ping`, `tools/list` and `tools/call`, and
//! writes one response per line. Tool calls run concurrently; a single writer task owns the
//! output stream, so responses may arrive in completion order rather than request order.

use anyhow::Context as _;
use r_bridge_tools::{RBridge, ResultRecord};
use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "r-mcp-bridge";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// What to do with one inbound message.
#[derive(Debug, PartialEq)]
enum Action {
    Reply(Value),
    Call {
        id: Value,
        name: String,
        arguments: Value,
    },
    Ignore,
}

/// Why [`serve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// Input reached EOF and every in-flight call was answered.
    InputClosed,
    /// `shutdown` resolved; in-flight calls were aborted.
    Shutdown,
}

/// Serve until `reader` reaches EOF or `shutdown` resolves.
///
/// Every spawned call has finished or been aborted, and every clone of `bridge` taken here
/// has been dropped, by the time this returns.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub async fn serve<R, W, S>(
    bridge: Arc<RBridge>,
    reader: R,
    writer: W,
    shutdown: S,
) -> anyhow::Result<ServeExit>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (tx, rx) = mpsc::unbounded_channel::<Value>();
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let mut lines = BufReader::new(reader).lines();
    let mut calls = JoinSet::new();
    let mut shutdown = std::pin::pin!(shutdown);

    let exit = loop {
        let next = tokio::select! {
            next = lines.next_line() => next,
            () = &mut shutdown => break Ok(ServeExit::Shutdown),
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(ServeExit::InputClosed),
            Err(e) => break Err(anyhow::Error::from(e).context("read request line")),
        };

        match parse_line(&bridge, &line) {
            Action::Reply(response) => {
                if tx.send(response).is_err() {
                    break Ok(ServeExit::InputClosed);
                }
            }
            Action::Call {
                id,
                name,
                arguments,
            } => {
                let bridge = bridge.clone();
                let tx = tx.clone();
                calls.spawn(async move {
                    let record = bridge.call_tool(&name, &arguments).await;
                    let _ = tx.send(call_response(&id, record));
                });
            }
            Action::Ignore => {}
        }

        while let Some(joined) = calls.try_join_next() {
            log_join_error(joined);
        }
    };

    if matches!(exit, Ok(ServeExit::InputClosed)) {
        tracing::debug!(in_flight = calls.len(), "input closed; draining tool calls");
    } else {
        tracing::info!(in_flight = calls.len(), "aborting in-flight tool calls");
        calls.abort_all();
    }
    while let Some(joined) = calls.join_next().await {
        log_join_error(joined);
    }

    drop(tx);
    drop(bridge);
    let written = writer_task.await.context("writer task panicked")?;
    let exit = exit?;
    written?;
    Ok(exit)
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    match joined {
        Err(e) if !e.is_cancelled() => tracing::error!(error = %e, "tool call task failed"),
        _ => {}
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message).context("serialize response")?;
        line.push(b'\n');
        writer.write_all(&line).await.context("write response")?;
        writer.flush().await.context("flush response")?;
    }
    Ok(())
}

fn parse_line(bridge: &RBridge, line: &str) -> Action {
    let line = line.trim();
    if line.is_empty() {
        return Action::Ignore;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(msg) => handle_message(bridge, &msg),
        Err(e) => {
            tracing::warn!(error = %e, "unparsable request line");
            Action::Reply(jsonrpc_err(&Value::Null, PARSE_ERROR, &format!("parse error: {e}")))
        }
    }
}

fn handle_message(bridge: &RBridge, msg: &Value) -> Action {
    // Notifications (no `id`) never get a response.
    let Some(id) = msg.get("id").cloned() else {
        if let Some(method) = msg.get("method").and_then(Value::as_str) {
            tracing::debug!(method, "notification");
        }
        return Action::Ignore;
    };
    let Some(method) = msg.get("method").and_then(Value::as_str) else {
        return Action::Reply(jsonrpc_err(&id, INVALID_REQUEST, "missing method"));
    };
    let params = msg.get("params").unwrap_or(&Value::Null);

    match method {
        "initialize" => Action::Reply(jsonrpc_ok(&id, &initialize_result(params))),
        "ping" => Action::Reply(jsonrpc_ok(&id, &json!({}))),
        "tools/list" => Action::Reply(jsonrpc_ok(&id, &json!({ "tools": bridge.tools() }))),
        "tools/call" => {
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return Action::Reply(jsonrpc_err(&id, INVALID_PARAMS, "missing tool name"));
            };
            if bridge.descriptor(name).is_none() {
                tracing::warn!(tool = name, "call to unknown tool");
                return Action::Reply(jsonrpc_err(
                    &id,
                    INVALID_PARAMS,
                    &format!("unknown tool: {name}"),
                ));
            }
            Action::Call {
                id,
                name: name.to_string(),
                arguments: params.get("arguments").cloned().unwrap_or(Value::Null),
            }
        }
        other => {
            tracing::debug!(method = other, "method not found");
            Action::Reply(jsonrpc_err(&id, METHOD_NOT_FOUND, "method not found"))
        }
    }
}

fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": {} },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
    })
}

/// The record goes out twice: as JSON text for plain clients and as `structuredContent`.
fn call_response(id: &Value, record: ResultRecord) -> Value {
    let is_error = record.is_failure();
    let value = record.into_value();
    let mut result = CallToolResult::success(vec![Content::text(value.to_string())]);
    result.structured_content = Some(value);
    result.is_error = Some(is_error);

    match serde_json::to_value(&result) {
        Ok(result) => jsonrpc_ok(id, &result),
        Err(e) => jsonrpc_err(id, INTERNAL_ERROR, &format!("serialize tool result: {e}")),
    }
}

fn jsonrpc_ok(id: &Value, result: &Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn jsonrpc_err(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
