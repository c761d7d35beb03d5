//! Conversion utilities for tool arguments and MongoDB replies.
//!
//! Tool arguments arrive as a JSON object; MongoDB replies are BSON documents
//! rendered as relaxed Extended JSON for MCP responses.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Convert a BSON document to relaxed Extended JSON.
pub fn document_to_json(doc: Document) -> JsonValue {
    Bson::Document(doc).into_relaxed_extjson()
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get an optional string argument from JSON arguments.
///
/// Empty strings count as absent.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Option<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

/// Helper to get an optional non-negative integer argument.
///
/// Accepts JSON integers and decimal strings; `null` counts as absent.
/// Anything else (negative, fractional, text) is rejected.
pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<u64>> {
    let invalid = |reason: &str| McpError::InvalidArg {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid("Expected a non-negative integer")),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| invalid("Expected a non-negative integer")),
        Some(_) => Err(invalid("Expected a non-negative integer")),
    }
}

/// Helper to get a required non-negative integer argument.
pub fn get_u64_arg(args: &Map<String, JsonValue>, name: &str) -> Result<u64> {
    get_optional_u64(args, name)?.ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get a string-or-number argument as text, e.g. an engine
/// version that agents send either as `"4.4"` or `4.4`.
pub fn get_text_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    match args.get(name) {
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        _ => get_string_arg(args, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_string_args() {
        let a = args(json!({"region_id": "cn-hangzhou", "blank": " ", "num": 3}));
        assert_eq!(get_string_arg(&a, "region_id").unwrap(), "cn-hangzhou");
        assert!(matches!(get_string_arg(&a, "blank"), Err(McpError::MissingArg(_))));
        assert!(matches!(get_string_arg(&a, "num"), Err(McpError::MissingArg(_))));
        assert_eq!(get_optional_string(&a, "blank"), None);
        assert_eq!(get_optional_string(&a, "missing"), None);
    }

    #[test]
    fn test_optional_u64() {
        let a = args(json!({
            "int": 5, "text": "12", "null": null, "neg": -1, "frac": 2.5, "word": "ten", "empty": ""
        }));
        assert_eq!(get_optional_u64(&a, "int").unwrap(), Some(5));
        assert_eq!(get_optional_u64(&a, "text").unwrap(), Some(12));
        assert_eq!(get_optional_u64(&a, "null").unwrap(), None);
        assert_eq!(get_optional_u64(&a, "empty").unwrap(), None);
        assert_eq!(get_optional_u64(&a, "missing").unwrap(), None);
        assert!(matches!(get_optional_u64(&a, "neg"), Err(McpError::InvalidArg { .. })));
        assert!(matches!(get_optional_u64(&a, "frac"), Err(McpError::InvalidArg { .. })));
        assert!(matches!(get_optional_u64(&a, "word"), Err(McpError::InvalidArg { .. })));
        assert!(matches!(get_u64_arg(&a, "missing"), Err(McpError::MissingArg(_))));
    }

    #[test]
    fn test_text_arg() {
        let a = args(json!({"v": 4.4, "s": "5.0"}));
        assert_eq!(get_text_arg(&a, "v").unwrap(), "4.4");
        assert_eq!(get_text_arg(&a, "s").unwrap(), "5.0");
    }

    #[test]
    fn test_document_to_json() {
        let reply = doc! {
            "databases": [{ "name": "admin", "sizeOnDisk": 40960_i64, "empty": false }],
            "totalSize": 40960_i64,
            "ok": 1.0,
        };
        let json = document_to_json(reply);
        assert_eq!(json["databases"][0]["name"], "admin");
        assert_eq!(json["databases"][0]["sizeOnDisk"], 40960);
        assert_eq!(json["ok"], 1.0);
    }
}
