//! MongoDB tools.
//!
//! Tools: list_databases, get_top_reusable_space_collections
//!
//! Each call opens its own connection and shuts it down before returning,
//! whether the call succeeded or not.

use serde_json::{Map, Value as JsonValue};

use crate::convert::{document_to_json, get_optional_string, get_optional_u64};
use crate::error::{McpError, Result};
use crate::ranker::{rank_reusable_space, DEFAULT_TOP_N};
use crate::session::McpSession;
use crate::tools::ToolDef;

pub const LIST_DATABASES: &str = "list_databases";
pub const TOP_REUSABLE_SPACE: &str = "get_top_reusable_space_collections";

const CONNECTION_STRING_HELP: &str = "MongoDB connection string including user and password. \
    Look it up with describe_replica_set_role when an instance ID is known, preferring the \
    public network address. Omit to use the server's configured connection.";

/// Get all MongoDB tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            LIST_DATABASES,
            "List all databases of a MongoDB instance with their on-disk sizes. Returns the \
             listDatabases reply: databases (name, sizeOnDisk, empty) and totalSize.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "connection_string": {
                        "type": "string",
                        "description": CONNECTION_STRING_HELP
                    }
                },
                "required": []
            }),
        ),
        ToolDef::new(
            TOP_REUSABLE_SPACE,
            "Find the collections with the most reusable (reclaimable) storage space. Scans every \
             collection of every database, reads WiredTiger block-manager statistics and returns \
             up to top_n entries of {database, collection, reusable_bytes}, largest first. \
             Collections whose statistics cannot be read are skipped. Use this to decide which \
             collections would benefit from compact.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "connection_string": {
                        "type": "string",
                        "description": CONNECTION_STRING_HELP
                    },
                    "top_n": {
                        "type": "integer",
                        "minimum": 0,
                        "default": DEFAULT_TOP_N,
                        "description": "Number of collections to return"
                    }
                },
                "required": []
            }),
        ),
    ]
}

/// Dispatch a MongoDB tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        LIST_DATABASES => dispatch_list_databases(session, args).await,
        TOP_REUSABLE_SPACE => dispatch_top_reusable_space(session, args).await,
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

// ── List databases ───────────────────────────────────────────────────────

async fn dispatch_list_databases(
    session: &McpSession,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let connection_string = get_optional_string(&args, "connection_string");
    let server = session.connect_mongo(connection_string.as_deref()).await?;

    let result = server.list_databases().await;
    server.shutdown().await;
    Ok(document_to_json(result?))
}

// ── Reusable space ───────────────────────────────────────────────────────

async fn dispatch_top_reusable_space(
    session: &McpSession,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let top_n = get_optional_u64(&args, "top_n")?
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(DEFAULT_TOP_N);
    let connection_string = get_optional_string(&args, "connection_string");

    let server = session.connect_mongo(connection_string.as_deref()).await?;
    let ranked = rank_reusable_space(&server, top_n).await;
    server.shutdown().await;

    Ok(serde_json::to_value(ranked?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MongoSettings};
    use serde_json::json;

    fn session(connection_string: Option<&str>) -> McpSession {
        McpSession::new(Config {
            mongodb: MongoSettings {
                connection_string: connection_string.map(str::to_string),
                connect_timeout: std::time::Duration::from_millis(200),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_no_configuration() {
        let err = dispatch(&session(None), TOP_REUSABLE_SPACE, Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Configuration(_)));

        let err = dispatch(&session(None), LIST_DATABASES, Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_negative_top_n_rejected_before_connecting() {
        let err = dispatch(
            &session(None),
            TOP_REUSABLE_SPACE,
            args(json!({ "top_n": -3 })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_failure() {
        let err = dispatch(
            &session(None),
            TOP_REUSABLE_SPACE,
            args(json!({
                "connection_string": "mongodb://127.0.0.1:1/?directConnection=true",
                "top_n": 5
            })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::Connection(_)));
        assert!(err.to_string().starts_with("Failed to connect to MongoDB"));
    }

    #[tokio::test]
    async fn test_configured_connection_used_when_argument_absent() {
        let session = session(Some("mongodb://127.0.0.1:1/?directConnection=true"));
        let err = dispatch(&session, LIST_DATABASES, Map::new()).await.unwrap_err();
        assert!(matches!(err, McpError::Connection(_)));
    }

    #[test]
    fn test_tool_definitions() {
        let defs = tools();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].input_schema["properties"]["top_n"]["default"], 10);
    }
}
