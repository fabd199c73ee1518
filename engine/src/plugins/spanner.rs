//! Cloud Spanner adapter.
//!
//! Talks to Spanner's PostgreSQL interface through PGAdapter using the sqlx
//! Postgres driver. The database path rides in the startup packet's database
//! field.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;

use common::errors::AppResult;
use common::models::{DatabaseType, GraphUnit, Operation, PluginConfig, RowSet, StorageUnit};

use super::sql::SqlCatalog;
use super::{port, required};
use crate::connection::PgSessionProvider;
use crate::plugin::PluginFunctions;
use crate::session::SessionProvider;

pub const PROJECT_ID_OPTION: &str = "ProjectId";
pub const INSTANCE_ID_OPTION: &str = "InstanceId";
pub const DEFAULT_PROJECT_ID: &str = "test-project";
pub const DEFAULT_INSTANCE_ID: &str = "test-instance";
pub const DEFAULT_HOST: &str = "localhost";

const CAPABILITIES: &[Operation] = &[
    Operation::IsAvailable,
    Operation::GetSchema,
    Operation::GetStorageUnits,
    Operation::GetRows,
    Operation::GetGraph,
];

/// Builds `projects/{project}/instances/{instance}/databases/{database}`.
pub fn database_path(config: &PluginConfig) -> AppResult<String> {
    let project = config.advanced_or(PROJECT_ID_OPTION, DEFAULT_PROJECT_ID);
    let instance = config.advanced_or(INSTANCE_ID_OPTION, DEFAULT_INSTANCE_ID);
    let database = required(&config.credentials.database, "database")?;

    Ok(format!(
        "projects/{}/instances/{}/databases/{}",
        project, instance, database
    ))
}

/// Connect options for the PGAdapter endpoint.
pub fn connect_options(config: &PluginConfig) -> AppResult<PgConnectOptions> {
    let creds = &config.credentials;
    let host = match creds.hostname.trim() {
        "" => DEFAULT_HOST,
        host => host,
    };

    let mut options = PgConnectOptions::new_without_pgpass()
        .host(host)
        .port(port(config)?)
        .database(&database_path(config)?);
    if !creds.username.is_empty() {
        options = options.username(&creds.username);
    }
    if !creds.password.is_empty() {
        options = options.password(&creds.password);
    }
    Ok(options)
}

pub struct SpannerPlugin {
    catalog: SqlCatalog,
}

impl SpannerPlugin {
    pub fn new(connect_timeout: Duration) -> Self {
        Self::with_provider(Arc::new(PgSessionProvider::new(
            DatabaseType::Spanner,
            connect_options,
            connect_timeout,
        )))
    }

    pub fn with_provider(provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            catalog: SqlCatalog::new(DatabaseType::Spanner, provider),
        }
    }
}

#[async_trait]
impl PluginFunctions for SpannerPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Spanner
    }

    fn capabilities(&self) -> &'static [Operation] {
        CAPABILITIES
    }

    async fn is_available(&self, config: &PluginConfig) -> AppResult<bool> {
        self.catalog.is_available(config).await
    }

    async fn get_schema(&self, config: &PluginConfig) -> AppResult<Vec<String>> {
        self.catalog.schemas(config).await
    }

    async fn get_storage_units(
        &self,
        config: &PluginConfig,
        schema: &str,
    ) -> AppResult<Vec<StorageUnit>> {
        self.catalog.storage_units(config, schema).await
    }

    async fn get_rows(
        &self,
        config: &PluginConfig,
        schema: &str,
        storage_unit: &str,
        filter: &str,
        page_size: u32,
        page_offset: u64,
    ) -> AppResult<RowSet> {
        self.catalog
            .rows(config, schema, storage_unit, filter, page_size, page_offset)
            .await
    }

    async fn get_graph(&self, config: &PluginConfig, schema: &str) -> AppResult<Vec<GraphUnit>> {
        self.catalog.graph(config, schema).await
    }
}
