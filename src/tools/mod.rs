//! Tool registry and dispatch.
//!
//! Tools come in two families: MongoDB tools that talk to a server over the
//! wire protocol, and Alibaba Cloud OpenAPI tools (DDS, VPC) that forward a
//! single signed request and return the response body unchanged.

pub mod dds;
pub mod mongo;
pub mod vpc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::session::McpSession;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "describe_db_instances")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create the registry with every MongoDB, DDS and VPC tool.
    pub fn new() -> Self {
        let mut tools = Vec::new();
        tools.extend(mongo::tools());
        tools.extend(dds::tools());
        tools.extend(vpc::tools());
        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    pub async fn dispatch(
        &self,
        session: &McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        match name {
            mongo::LIST_DATABASES | mongo::TOP_REUSABLE_SPACE => {
                mongo::dispatch(session, name, args).await
            }
            vpc::DESCRIBE_VPCS | vpc::DESCRIBE_VSWITCHES => vpc::dispatch(session, name, args).await,
            _ => dds::dispatch(session, name, args).await,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for the JSON Schema of tools whose parameters are plain
/// required strings. Schemas with descriptions or defaults are written out
/// with `serde_json::json!`.
#[macro_export]
macro_rules! schema {
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@type $req_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    (@type string) => { serde_json::json!({"type": "string"}) };
}
