//! ApsaraDB for MongoDB (DDS) OpenAPI tools.
//!
//! Tools: describe_available_zones, describe_available_resource,
//! describe_db_instances, describe_db_instance_attribute,
//! describe_replica_set_role, allocate_public_network_address,
//! create_db_instance
//!
//! Every tool sends one request and returns the response body as-is.

use serde_json::{Map, Value as JsonValue};

use crate::convert::{
    get_optional_string, get_optional_u64, get_string_arg, get_text_arg, get_u64_arg,
};
use crate::error::{McpError, Result};
use crate::openapi::Params;
use crate::schema;
use crate::session::McpSession;
use crate::tools::ToolDef;

const DEFAULT_REPLICATION_FACTOR: u64 = 3;

const STORAGE_TYPE_HELP: &str = "Storage type: local_ssd, cloud_essd1, cloud_essd2, cloud_essd3 \
    or cloud_auto. Engine versions below 4.2 only support local_ssd; versions above 4.2 only \
    the cloud_* types; 4.2 supports all of them.";

/// Get all DDS tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "describe_available_zones",
            "List the zones in a region where MongoDB instances can be created.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "region_id": {
                        "type": "string",
                        "description": "Region ID, e.g. cn-hangzhou"
                    }
                },
                "required": ["region_id"]
            }),
        ),
        ToolDef::new(
            "describe_available_resource",
            "List the instance classes that can be purchased for the given zone, payment type, \
             architecture, storage type, engine version and node count.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "region_id": { "type": "string", "description": "Region ID" },
                    "zone_id": {
                        "type": "string",
                        "description": "Zone ID, from describe_available_zones"
                    },
                    "instance_charge_type": {
                        "type": "string",
                        "enum": ["PrePaid", "PostPaid"],
                        "description": "Payment type"
                    },
                    "db_type": {
                        "type": "string",
                        "enum": ["normal", "sharding"],
                        "description": "normal is a replica set, sharding is a sharded cluster"
                    },
                    "storage_type": { "type": "string", "description": STORAGE_TYPE_HELP },
                    "engine_version": {
                        "type": ["string", "number"],
                        "description": "Engine version: 3.4, 4.0, 4.2, 4.4, 5.0, 6.0, 7.0 or 8.0"
                    },
                    "replication_factor": {
                        "type": ["string", "integer"],
                        "description": "Number of nodes: 1, 3, 5 or 7"
                    }
                },
                "required": [
                    "region_id", "zone_id", "instance_charge_type", "db_type",
                    "storage_type", "engine_version", "replication_factor"
                ]
            }),
        ),
        ToolDef::new(
            "describe_db_instances",
            "List all MongoDB instances in a region.",
            schema!(object {
                required: { "region_id": string }
            }),
        ),
        ToolDef::new(
            "describe_db_instance_attribute",
            "Get the detailed attributes of one MongoDB instance.",
            schema!(object {
                required: { "db_instance_id": string }
            }),
        ),
        ToolDef::new(
            "describe_replica_set_role",
            "Get the connection addresses and node roles of a MongoDB instance. This is the only \
             way to obtain the public network address.",
            schema!(object {
                required: { "db_instance_id": string }
            }),
        ),
        ToolDef::new(
            "allocate_public_network_address",
            "Allocate a public address for every non-hidden node of a MongoDB instance so it can \
             be reached from the internet.",
            schema!(object {
                required: { "db_instance_id": string }
            }),
        ),
        ToolDef::new(
            "create_db_instance",
            "Create a MongoDB replica set instance. Look up db_instance_class with \
             describe_available_resource, vpc_id with describe_vpcs and vswitch_id with \
             describe_vswitches first. Returns the new instance ID and order ID.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "region_id": { "type": "string", "description": "Region ID" },
                    "zone_id": { "type": "string", "description": "Zone ID" },
                    "engine_version": {
                        "type": ["string", "number"],
                        "description": "Engine version, e.g. 6.0"
                    },
                    "db_instance_class": {
                        "type": "string",
                        "description": "Instance class. Classes ending in .c are general purpose \
                                        and usually create faster; classes ending in .d are dedicated."
                    },
                    "db_instance_storage": {
                        "type": "integer",
                        "description": "Storage size in GB"
                    },
                    "account_password": {
                        "type": "string",
                        "description": "Password of the root account"
                    },
                    "charge_type": {
                        "type": "string",
                        "enum": ["PrePaid", "PostPaid"],
                        "description": "Payment type"
                    },
                    "vpc_id": { "type": "string", "description": "VPC ID" },
                    "vswitch_id": {
                        "type": "string",
                        "description": "VSwitch ID in the chosen zone"
                    },
                    "storage_type": { "type": "string", "description": STORAGE_TYPE_HELP },
                    "security_ip_list": {
                        "type": "string",
                        "description": "Comma-separated IP whitelist (default 127.0.0.1)"
                    },
                    "period": {
                        "type": "integer",
                        "description": "Subscription length in months; required for PrePaid"
                    },
                    "replication_factor": {
                        "type": "integer",
                        "default": DEFAULT_REPLICATION_FACTOR,
                        "description": "Number of nodes: 1, 3, 5 or 7"
                    }
                },
                "required": [
                    "region_id", "zone_id", "engine_version", "db_instance_class",
                    "db_instance_storage", "account_password", "charge_type", "vpc_id",
                    "vswitch_id", "storage_type"
                ]
            }),
        ),
    ]
}

/// Dispatch a DDS tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let (action, params) = match name {
        "describe_available_zones" => (
            "DescribeAvailabilityZones",
            Params::new().set("RegionId", get_string_arg(&args, "region_id")?),
        ),

        "describe_available_resource" => (
            "DescribeAvailableResource",
            Params::new()
                .set("RegionId", get_string_arg(&args, "region_id")?)
                .set("ZoneId", get_string_arg(&args, "zone_id")?)
                .set("InstanceChargeType", get_string_arg(&args, "instance_charge_type")?)
                .set("DbType", get_string_arg(&args, "db_type")?)
                .set("StorageType", get_string_arg(&args, "storage_type")?)
                .set("EngineVersion", get_text_arg(&args, "engine_version")?)
                .set("ReplicationFactor", get_text_arg(&args, "replication_factor")?),
        ),

        "describe_db_instances" => (
            "DescribeDBInstances",
            Params::new().set("RegionId", get_string_arg(&args, "region_id")?),
        ),

        "describe_db_instance_attribute" => (
            "DescribeDBInstanceAttribute",
            Params::new().set("DBInstanceId", get_string_arg(&args, "db_instance_id")?),
        ),

        "describe_replica_set_role" => (
            "DescribeReplicaSetRole",
            Params::new().set("DBInstanceId", get_string_arg(&args, "db_instance_id")?),
        ),

        "allocate_public_network_address" => (
            "AllocatePublicNetworkAddress",
            Params::new().set("DBInstanceId", get_string_arg(&args, "db_instance_id")?),
        ),

        "create_db_instance" => ("CreateDBInstance", create_db_instance_params(&args)?),

        _ => return Err(McpError::UnknownTool(name.to_string())),
    };

    let client = session.dds_client()?;
    client.call(action, params).await
}

fn create_db_instance_params(args: &Map<String, JsonValue>) -> Result<Params> {
    let charge_type = get_string_arg(args, "charge_type")?;
    let period = get_optional_u64(args, "period")?.filter(|p| *p > 0);
    if charge_type == "PrePaid" && period.is_none() {
        return Err(McpError::InvalidArg {
            name: "period".to_string(),
            reason: "period is required when charge_type is PrePaid".to_string(),
        });
    }
    let replication_factor = get_optional_u64(args, "replication_factor")?
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_REPLICATION_FACTOR);

    Ok(Params::new()
        .set("RegionId", get_string_arg(args, "region_id")?)
        .set("ZoneId", get_string_arg(args, "zone_id")?)
        .set("EngineVersion", get_text_arg(args, "engine_version")?)
        .set("DBInstanceClass", get_string_arg(args, "db_instance_class")?)
        .set("DBInstanceStorage", get_u64_arg(args, "db_instance_storage")?)
        .set("AccountPassword", get_string_arg(args, "account_password")?)
        .set("ChargeType", charge_type)
        .set("VpcId", get_string_arg(args, "vpc_id")?)
        .set("VSwitchId", get_string_arg(args, "vswitch_id")?)
        .set("StorageType", get_string_arg(args, "storage_type")?)
        .set_opt("SecurityIPList", get_optional_string(args, "security_ip_list"))
        .set_opt("Period", period)
        .set("ReplicationFactor", replication_factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CloudSettings, Config};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    fn session_for(endpoint: &str) -> McpSession {
        McpSession::new(Config {
            cloud: CloudSettings {
                access_key_id: Some("testid".into()),
                access_key_secret: Some("testsecret".into()),
                dds_endpoint: endpoint.to_string(),
                vpc_endpoint: None,
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn create_args() -> JsonValue {
        json!({
            "region_id": "cn-hangzhou",
            "zone_id": "cn-hangzhou-h",
            "engine_version": 6.0,
            "db_instance_class": "mdb.shard.2x.xlarge.d",
            "db_instance_storage": 20,
            "account_password": "Pa55word!",
            "charge_type": "PostPaid",
            "vpc_id": "vpc-1",
            "vswitch_id": "vsw-1",
            "storage_type": "cloud_essd1"
        })
    }

    #[test]
    fn test_create_params() {
        let params = create_db_instance_params(&args(create_args())).unwrap();
        assert_eq!(params.get("DBInstanceClass"), Some("mdb.shard.2x.xlarge.d"));
        assert_eq!(params.get("DBInstanceStorage"), Some("20"));
        assert_eq!(params.get("ReplicationFactor"), Some("3"));
        assert_eq!(params.get("VSwitchId"), Some("vsw-1"));
        assert_eq!(params.get("Period"), None);
        assert_eq!(params.get("SecurityIPList"), None);
    }

    #[test]
    fn test_zero_replication_factor_uses_default() {
        let mut a = args(create_args());
        a.insert("replication_factor".into(), json!(0));
        let params = create_db_instance_params(&a).unwrap();
        assert_eq!(params.get("ReplicationFactor"), Some("3"));

        a.insert("replication_factor".into(), json!(5));
        let params = create_db_instance_params(&a).unwrap();
        assert_eq!(params.get("ReplicationFactor"), Some("5"));
    }

    #[test]
    fn test_prepaid_requires_period() {
        let mut a = args(create_args());
        a.insert("charge_type".into(), json!("PrePaid"));
        let err = create_db_instance_params(&a).unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "period"));

        a.insert("period".into(), json!(12));
        a.insert("security_ip_list".into(), json!("10.0.0.0/8"));
        let params = create_db_instance_params(&a).unwrap();
        assert_eq!(params.get("Period"), Some("12"));
        assert_eq!(params.get("SecurityIPList"), Some("10.0.0.0/8"));
    }

    #[tokio::test]
    async fn test_prepaid_without_period_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut a = args(create_args());
        a.insert("charge_type".into(), json!("PrePaid"));
        let result = dispatch(&session_for(&server.uri()), "create_db_instance", a).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_required_arg() {
        let session = session_for("http://127.0.0.1:1");
        let err = dispatch(&session, "describe_db_instance_attribute", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::MissingArg(ref n) if n == "db_instance_id"));
    }

    #[tokio::test]
    async fn test_describe_replica_set_role_passthrough() {
        let server = MockServer::start().await;
        let reply = json!({
            "RequestId": "r-1",
            "DBInstanceId": "dds-bp1",
            "ReplicaSets": { "ReplicaSet": [{
                "ReplicaSetRole": "Primary",
                "ConnectionDomain": "dds-bp1-pub.mongodb.rds.aliyuncs.com",
                "ConnectionPort": "3717",
                "NetworkType": "Public"
            }]}
        });
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeReplicaSetRole"))
            .and(body_string_contains("DBInstanceId=dds-bp1"))
            .and(body_string_contains("Version=2015-12-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let body = dispatch(
            &session_for(&server.uri()),
            "describe_replica_set_role",
            args(json!({ "db_instance_id": "dds-bp1" })),
        )
        .await
        .unwrap();
        assert_eq!(body, reply);
    }

    #[tokio::test]
    async fn test_describe_available_resource_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeAvailableResource"))
            .and(body_string_contains("EngineVersion=4.4"))
            .and(body_string_contains("ReplicationFactor=3"))
            .and(body_string_contains("DbType=normal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RequestId": "r" })))
            .expect(1)
            .mount(&server)
            .await;

        dispatch(
            &session_for(&server.uri()),
            "describe_available_resource",
            args(json!({
                "region_id": "cn-hangzhou",
                "zone_id": "cn-hangzhou-h",
                "instance_charge_type": "PostPaid",
                "db_type": "normal",
                "storage_type": "cloud_essd1",
                "engine_version": "4.4",
                "replication_factor": "3"
            })),
        )
        .await
        .unwrap();
    }
}
