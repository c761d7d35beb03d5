//! Live MongoDB server handle.
//!
//! The driver connects lazily, so `connect` pings `admin` to surface an
//! unreachable server as a connection error before any real work starts.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;

use crate::config::ConnectionDescriptor;
use crate::error::{McpError, Result};
use crate::ranker::StatsSource;

const APP_NAME: &str = "apsaradb-mongodb-mcp";

/// A connected MongoDB deployment, owned by a single tool call.
pub struct MongoServer {
    client: Client,
}

impl MongoServer {
    /// Build a client for `descriptor` and verify the server answers.
    pub async fn connect(descriptor: &ConnectionDescriptor, timeout: Duration) -> Result<Self> {
        let options = client_options(descriptor, timeout).await?;
        let client =
            Client::with_options(options).map_err(|e| McpError::Connection(e.to_string()))?;

        if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
            tracing::error!(server = %descriptor.redacted(), error = %e, "Failed to connect to MongoDB");
            client.shutdown().await;
            return Err(McpError::Connection(format!(
                "{}, connection: {}",
                e,
                descriptor.redacted()
            )));
        }

        tracing::debug!(server = %descriptor.redacted(), "Connected to MongoDB");
        Ok(Self { client })
    }

    /// Run `listDatabases` against `admin`.
    pub async fn list_databases(&self) -> Result<Document> {
        let reply = self
            .client
            .database("admin")
            .run_command(doc! { "listDatabases": 1 })
            .await?;
        Ok(reply)
    }

    /// Release the connection pool.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl StatsSource for MongoServer {
    async fn database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self.client.database(database).list_collection_names().await?)
    }

    async fn collection_stats(&self, database: &str, collection: &str) -> Result<Document> {
        let stats = self
            .client
            .database(database)
            .run_command(doc! { "collStats": collection })
            .await?;
        Ok(stats)
    }
}

/// Driver options for a descriptor. The timeout only applies when the
/// connection string does not set its own.
pub async fn client_options(
    descriptor: &ConnectionDescriptor,
    timeout: Duration,
) -> Result<ClientOptions> {
    let mut options = match descriptor {
        ConnectionDescriptor::Uri(uri) => ClientOptions::parse(uri.as_str()).await.map_err(|e| {
            McpError::Configuration(format!(
                "Invalid connection string '{}': {}",
                descriptor.redacted(),
                e
            ))
        })?,
        ConnectionDescriptor::Fields(fields) => {
            let mut credential = Credential::default();
            credential.username = Some(fields.user.clone());
            credential.password = Some(fields.password.clone());
            credential.source = Some(fields.database.clone());

            let mut options = ClientOptions::default();
            options.hosts = vec![ServerAddress::Tcp {
                host: fields.host.clone(),
                port: Some(fields.port),
            }];
            options.credential = Some(credential);
            options
        }
    };

    options.server_selection_timeout.get_or_insert(timeout);
    options.connect_timeout.get_or_insert(timeout);
    options.app_name.get_or_insert_with(|| APP_NAME.to_string());
    Ok(options)
}
