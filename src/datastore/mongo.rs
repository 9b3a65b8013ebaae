//! MongoDB connector.
//!
//! The driver connects lazily, so building a `Client` proves nothing. The
//! connector issues a single `ping` against `admin` to confirm the server is
//! reachable before reporting success.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::config::DatastoreConfig;
use crate::datastore::connector::Connector;
use crate::datastore::types::DatastoreResult;

/// Database used when the connection string does not name one.
pub const DEFAULT_DATABASE: &str = "cloudnative";

/// Live MongoDB client plus the application's database.
#[derive(Debug, Clone)]
pub struct MongoHandle {
    client: Client,
    database: Database,
}

impl MongoHandle {
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The database named in the connection string.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

/// Production [`Connector`] backed by the official driver.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    app_name: String,
    connect_timeout: Duration,
    server_selection_timeout: Duration,
}

impl MongoConnector {
    pub fn new(config: &DatastoreConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            server_selection_timeout: Duration::from_secs(config.server_selection_timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = MongoHandle;

    async fn connect(&self, uri: &str) -> DatastoreResult<MongoHandle> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(self.app_name.clone());
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.server_selection_timeout);

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;

        tracing::debug!(database = %database_name, "MongoDB ping succeeded");

        let database = client.database(&database_name);
        Ok(MongoHandle { client, database })
    }
}
