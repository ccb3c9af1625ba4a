//! JSON-RPC 2.0 request handling for the MCP tool surface.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tinvest_bridge::{tool_definitions, ToolBridge};
use tracing::{debug, warn};

pub const SERVER_NAME: &str = "Tinkoff Investments MCP";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Answers MCP requests by dispatching tool calls to the bridge.
#[derive(Clone)]
pub struct McpServer {
    bridge: ToolBridge,
}

impl McpServer {
    pub fn new(bridge: ToolBridge) -> Self {
        Self { bridge }
    }

    /// Handle one raw JSON-RPC message. `None` means nothing is sent back.
    pub async fn handle_raw(&self, raw: &str) -> Option<Response> {
        let request: Request = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC message");
                return Some(Response::err(Value::Null, PARSE_ERROR, format!("parse error: {e}")));
            }
        };
        self.handle(request).await
    }

    pub async fn handle(&self, request: Request) -> Option<Response> {
        debug!(method = %request.method, "JSON-RPC request");
        let Some(id) = request.id else {
            // Notifications, including notifications/initialized, get no reply.
            return None;
        };
        if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            return Some(Response::err(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
        }

        let response = match request.method.as_str() {
            "initialize" => Response::ok(id, initialize_result()),
            "ping" => Response::ok(id, json!({})),
            "tools/list" => Response::ok(id, json!({ "tools": tool_definitions() })),
            "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
                Ok(params) => Response::ok(id, self.call_tool(params).await),
                Err(e) => Response::err(id, INVALID_PARAMS, format!("invalid params: {e}")),
            },
            other => Response::err(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
        };
        Some(response)
    }

    async fn call_tool(&self, params: CallParams) -> Value {
        let (text, is_error) = match self.bridge.call(&params.name, &params.arguments).await {
            Ok(text) => (text, false),
            Err(e) => (e.to_string(), true),
        };
        json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error,
        })
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}
