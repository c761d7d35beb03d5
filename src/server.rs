//! MCP server over stdio.
//!
//! Newline-delimited JSON-RPC 2.0: one request per line on stdin, one
//! response per line on stdout. Requests are handled one at a time.
//! Notifications (no `id`) never get a response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{McpError, Result};
use crate::session::McpSession;
use crate::tools::ToolRegistry;

/// MCP protocol revision spoken by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const SERVER_NAME: &str = "apsaradb-mongodb-mcp";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

/// An incoming JSON-RPC request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker, must be "2.0"
    pub jsonrpc: String,
    /// Request ID; absent for notifications
    #[serde(default)]
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Human-readable message
    pub message: String,
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// ID of the request being answered
    pub id: JsonValue,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: JsonValue, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// The MCP server: session plus tool registry.
pub struct McpServer {
    session: McpSession,
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a server exposing every tool.
    pub fn new(session: McpSession) -> Self {
        Self {
            session,
            registry: ToolRegistry::new(),
        }
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(tools = self.registry.tools().len(), "MCP server ready on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Answer requests from `reader` on `writer` until end of input.
    ///
    /// Only I/O failures end the loop; a line that is not UTF-8 gets a
    /// parse error like any other malformed input.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim_end()).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Request is not valid UTF-8");
                    Some(JsonRpcResponse::error(
                        JsonValue::Null,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
    }

    /// Handle one raw input line.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: JsonValue = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable request");
                return Some(JsonRpcResponse::error(
                    JsonValue::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => id.map(|id| {
                JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e))
            }),
        }
    }

    /// Handle a decoded request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                serde_json::json!({ "tools": self.registry.tools() }),
            ),
            "tools/call" => match self.call_tool(request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::error(id, e.code(), e.to_string()),
            },
            other => {
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };
        Some(response)
    }

    fn initialize_result(&self) -> JsonValue {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": "Tools for Alibaba Cloud ApsaraDB for MongoDB: instance management \
                             through OpenAPI and direct queries against MongoDB servers."
        })
    }

    /// Run `tools/call`. Protocol problems (bad params, unknown tool) are
    /// `Err`; a tool that ran and failed is an `isError` result.
    async fn call_tool(&self, params: Option<JsonValue>) -> Result<JsonValue> {
        let params = params.ok_or_else(|| McpError::MissingArg("params".to_string()))?;
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::MissingArg("name".to_string()))?
            .to_string();
        let args = match params.get("arguments") {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(map)) => map.clone(),
            Some(_) => {
                return Err(McpError::InvalidArg {
                    name: "arguments".to_string(),
                    reason: "Expected an object".to_string(),
                })
            }
        };

        if !self.registry.tools().iter().any(|t| t.name == name) {
            return Err(McpError::UnknownTool(name));
        }

        tracing::info!(tool = %name, "Calling tool");
        match self.registry.dispatch(&self.session, &name, args).await {
            Ok(value) => Ok(tool_result(&value, false)),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool call failed");
                Ok(tool_result(&JsonValue::String(e.to_string()), true))
            }
        }
    }
}

/// Wrap a tool's output as MCP text content.
fn tool_result(value: &JsonValue, is_error: bool) -> JsonValue {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}
