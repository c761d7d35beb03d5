//! MCP session state.
//!
//! Owns the process configuration and the shared HTTP client. Tool handlers
//! borrow the session to resolve MongoDB connections and build OpenAPI
//! clients; nothing in here is mutated after start.

use std::time::Duration;

use crate::config::{Config, ConnectionDescriptor};
use crate::error::Result;
use crate::mongo::MongoServer;
use crate::openapi::{OpenApiClient, DDS_API_VERSION, VPC_API_VERSION};

const OPENAPI_TIMEOUT: Duration = Duration::from_secs(30);

/// Context shared by every tool call.
pub struct McpSession {
    config: Config,
    http: reqwest::Client,
}

impl McpSession {
    /// Create a session from the startup configuration.
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(OPENAPI_TIMEOUT)
            .user_agent(concat!("apsaradb-mongodb-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    /// The startup configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the connection for a call that may carry its own string.
    pub fn resolve_connection(&self, explicit: Option<&str>) -> Result<ConnectionDescriptor> {
        self.config.mongodb.resolve(explicit).map_err(|e| {
            tracing::error!(error = %e, "Missing required database configuration");
            e
        })
    }

    /// Resolve and connect. The caller owns the returned handle and must
    /// shut it down.
    pub async fn connect_mongo(&self, explicit: Option<&str>) -> Result<MongoServer> {
        let descriptor = self.resolve_connection(explicit)?;
        MongoServer::connect(&descriptor, self.config.mongodb.connect_timeout).await
    }

    /// Client for the DDS (ApsaraDB for MongoDB) service.
    pub fn dds_client(&self) -> Result<OpenApiClient> {
        let credentials = self.config.cloud.credentials()?;
        Ok(OpenApiClient::new(
            self.http.clone(),
            &self.config.cloud.dds_endpoint,
            DDS_API_VERSION,
            credentials,
        ))
    }

    /// Client for the VPC service in `region_id`.
    pub fn vpc_client(&self, region_id: &str) -> Result<OpenApiClient> {
        let credentials = self.config.cloud.credentials()?;
        Ok(OpenApiClient::new(
            self.http.clone(),
            &self.config.cloud.vpc_endpoint_for(region_id),
            VPC_API_VERSION,
            credentials,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudSettings;
    use crate::error::McpError;

    #[test]
    fn test_clients_require_credentials() {
        let session = McpSession::new(Config::default()).unwrap();
        assert!(matches!(session.dds_client(), Err(McpError::Configuration(_))));
        assert!(matches!(
            session.vpc_client("cn-hangzhou"),
            Err(McpError::Configuration(_))
        ));
    }

    #[test]
    fn test_client_endpoints() {
        let config = Config {
            cloud: CloudSettings {
                access_key_id: Some("id".into()),
                access_key_secret: Some("secret".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let session = McpSession::new(config).unwrap();
        assert_eq!(
            session.dds_client().unwrap().base_url(),
            "https://mongodb.aliyuncs.com"
        );
        assert_eq!(
            session.vpc_client("cn-hangzhou").unwrap().base_url(),
            "https://vpc.cn-hangzhou.aliyuncs.com"
        );
    }

    #[test]
    fn test_missing_configuration_logged_on_use() {
        let session = McpSession::new(Config::default()).unwrap();
        let (result, logs) =
            crate::config::tests::capture_logs(|| session.resolve_connection(None));
        assert!(result.is_err());
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("Missing required database configuration"));
    }

    #[tokio::test]
    async fn test_connect_without_configuration() {
        let session = McpSession::new(Config::default()).unwrap();
        let result = session.connect_mongo(None).await;
        assert!(matches!(result, Err(McpError::Configuration(_))));
    }
}
