//! VPC OpenAPI tools.
//!
//! Tools: describe_vpcs, describe_vswitches

use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_optional_string, get_optional_u64, get_string_arg};
use crate::error::{McpError, Result};
use crate::openapi::Params;
use crate::session::McpSession;
use crate::tools::ToolDef;

pub const DESCRIBE_VPCS: &str = "describe_vpcs";
pub const DESCRIBE_VSWITCHES: &str = "describe_vswitches";

const DEFAULT_PAGE_NUMBER: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;

fn paging_properties() -> Map<String, JsonValue> {
    let props = serde_json::json!({
        "page_number": {
            "type": "integer",
            "default": DEFAULT_PAGE_NUMBER,
            "description": "Page number, starting at 1"
        },
        "page_size": {
            "type": "integer",
            "default": DEFAULT_PAGE_SIZE,
            "maximum": 50,
            "description": "Entries per page, at most 50"
        }
    });
    props.as_object().cloned().unwrap_or_default()
}

/// Get all VPC tool definitions.
pub fn tools() -> Vec<ToolDef> {
    let mut vpc_props = serde_json::json!({
        "region_id": { "type": "string", "description": "Region ID of the VPC" },
        "vpc_id": {
            "type": "string",
            "description": "VPC ID; up to 20 IDs separated by commas"
        },
        "vpc_name": { "type": "string", "description": "VPC name" }
    });
    if let Some(obj) = vpc_props.as_object_mut() {
        obj.extend(paging_properties());
    }

    let mut vswitch_props = serde_json::json!({
        "region_id": { "type": "string", "description": "Region ID of the VSwitch" },
        "vpc_id": { "type": "string", "description": "VPC the VSwitch belongs to" },
        "vswitch_id": { "type": "string", "description": "VSwitch ID" },
        "vswitch_name": { "type": "string", "description": "VSwitch name" },
        "zone_id": { "type": "string", "description": "Zone of the VSwitch" }
    });
    if let Some(obj) = vswitch_props.as_object_mut() {
        obj.extend(paging_properties());
    }

    vec![
        ToolDef::new(
            DESCRIBE_VPCS,
            "List VPCs in a region, optionally filtered by ID or name. Use it to pick the vpc_id \
             for create_db_instance.",
            serde_json::json!({
                "type": "object",
                "properties": vpc_props,
                "required": ["region_id"]
            }),
        ),
        ToolDef::new(
            DESCRIBE_VSWITCHES,
            "List VSwitches, optionally filtered by VPC, zone, ID or name. Use it to pick the \
             vswitch_id for create_db_instance; the VSwitch must be in the instance's zone.",
            serde_json::json!({
                "type": "object",
                "properties": vswitch_props,
                "required": ["region_id"]
            }),
        ),
    ]
}

/// Dispatch a VPC tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let region_id = get_string_arg(&args, "region_id")?;
    let page_number = get_optional_u64(&args, "page_number")?.unwrap_or(DEFAULT_PAGE_NUMBER);
    let page_size = get_optional_u64(&args, "page_size")?.unwrap_or(DEFAULT_PAGE_SIZE);

    let base = Params::new()
        .set("RegionId", &region_id)
        .set("PageNumber", page_number)
        .set("PageSize", page_size)
        .set_opt("VpcId", get_optional_string(&args, "vpc_id"));

    let (action, params) = match name {
        DESCRIBE_VPCS => (
            "DescribeVpcs",
            base.set_opt("VpcName", get_optional_string(&args, "vpc_name")),
        ),
        DESCRIBE_VSWITCHES => (
            "DescribeVSwitches",
            base.set_opt("VSwitchId", get_optional_string(&args, "vswitch_id"))
                .set_opt("VSwitchName", get_optional_string(&args, "vswitch_name"))
                .set_opt("ZoneId", get_optional_string(&args, "zone_id")),
        ),
        _ => return Err(McpError::UnknownTool(name.to_string())),
    };

    let client = session.vpc_client(&region_id)?;
    client.call(action, params).await
}
