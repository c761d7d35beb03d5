//! apsaradb-mongodb-mcp binary.
//!
//! Reads configuration from flags, environment variables and an optional
//! `.env` file, then serves MCP over stdio. Logs go to stderr.

use std::time::Duration;

use apsaradb_mongodb_mcp::config::{CloudSettings, MongoSettings, DEFAULT_DDS_ENDPOINT};
use apsaradb_mongodb_mcp::{Config, McpServer, McpSession};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// MCP server for Alibaba Cloud ApsaraDB for MongoDB.
#[derive(Parser, Debug)]
#[command(name = "apsaradb-mongodb-mcp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Default MongoDB connection string
    #[arg(long, env = "MONGODB_CONNECTION_STRING", hide_env_values = true)]
    mongodb_connection_string: Option<String>,

    /// MongoDB host, used when no connection string is set
    #[arg(long, env = "MONGODB_HOST")]
    mongodb_host: Option<String>,

    /// MongoDB port
    #[arg(long, env = "MONGODB_PORT")]
    mongodb_port: Option<String>,

    /// MongoDB user
    #[arg(long, env = "MONGODB_USER")]
    mongodb_user: Option<String>,

    /// MongoDB password
    #[arg(long, env = "MONGODB_PASSWORD", hide_env_values = true)]
    mongodb_password: Option<String>,

    /// MongoDB authentication database
    #[arg(long, env = "MONGODB_DATABASE")]
    mongodb_database: Option<String>,

    /// Server selection and connect timeout, in seconds
    #[arg(long, env = "MONGODB_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Alibaba Cloud AccessKey ID
    #[arg(long, env = "ALIBABA_CLOUD_ACCESS_KEY_ID")]
    access_key_id: Option<String>,

    /// Alibaba Cloud AccessKey secret
    #[arg(long, env = "ALIBABA_CLOUD_ACCESS_KEY_SECRET", hide_env_values = true)]
    access_key_secret: Option<String>,

    /// DDS OpenAPI endpoint
    #[arg(long, env = "DDS_ENDPOINT", default_value = DEFAULT_DDS_ENDPOINT)]
    dds_endpoint: String,

    /// Fixed VPC OpenAPI endpoint (default: vpc.<region>.aliyuncs.com)
    #[arg(long, env = "VPC_ENDPOINT")]
    vpc_endpoint: Option<String>,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            mongodb: MongoSettings {
                connection_string: self.mongodb_connection_string,
                host: self.mongodb_host,
                port: self.mongodb_port,
                user: self.mongodb_user,
                password: self.mongodb_password,
                database: self.mongodb_database,
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            },
            cloud: CloudSettings {
                access_key_id: self.access_key_id,
                access_key_secret: self.access_key_secret,
                dds_endpoint: self.dds_endpoint,
                vpc_endpoint: self.vpc_endpoint,
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs must go to stderr; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("apsaradb_mongodb_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let config = cli.into_config();
    match config.mongodb.resolve(None) {
        Ok(descriptor) => tracing::info!(
            connection = %descriptor.redacted(),
            "Database configuration loaded"
        ),
        Err(_) => tracing::info!("No default database configuration; tools need connection_string"),
    }

    let session = match McpSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize session");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting ApsaraDB MongoDB MCP server on stdio");
    let server = McpServer::new(session);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
