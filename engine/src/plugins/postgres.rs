//! PostgreSQL adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use common::errors::{AppError, AppResult};
use common::models::{DatabaseType, GraphUnit, Operation, PluginConfig, RowSet, StorageUnit};

use super::sql::SqlCatalog;
use super::{port, required};
use crate::connection::PgSessionProvider;
use crate::plugin::PluginFunctions;
use crate::session::SessionProvider;

pub const SSL_MODE_OPTION: &str = "SSL Mode";
pub const DEFAULT_SSL_MODE: &str = "prefer";

const CAPABILITIES: &[Operation] = &[
    Operation::IsAvailable,
    Operation::GetDatabases,
    Operation::GetSchema,
    Operation::GetStorageUnits,
    Operation::GetRows,
    Operation::GetGraph,
];

pub fn connect_options(config: &PluginConfig) -> AppResult<PgConnectOptions> {
    let creds = &config.credentials;
    let host = required(&creds.hostname, "hostname")?;
    let database = required(&creds.database, "database")?;

    let raw_mode = config.advanced_or(SSL_MODE_OPTION, DEFAULT_SSL_MODE);
    let ssl_mode: PgSslMode = raw_mode
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("invalid SSL mode: {}", raw_mode)))?;

    Ok(PgConnectOptions::new_without_pgpass()
        .host(host)
        .port(port(config)?)
        .username(&creds.username)
        .password(&creds.password)
        .database(database)
        .ssl_mode(ssl_mode))
}

pub struct PostgresPlugin {
    catalog: SqlCatalog,
}

impl PostgresPlugin {
    pub fn new(connect_timeout: Duration) -> Self {
        Self::with_provider(Arc::new(PgSessionProvider::new(
            DatabaseType::Postgres,
            connect_options,
            connect_timeout,
        )))
    }

    pub fn with_provider(provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            catalog: SqlCatalog::new(DatabaseType::Postgres, provider),
        }
    }
}

#[async_trait]
impl PluginFunctions for PostgresPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn capabilities(&self) -> &'static [Operation] {
        CAPABILITIES
    }

    async fn is_available(&self, config: &PluginConfig) -> AppResult<bool> {
        self.catalog.is_available(config).await
    }

    async fn get_databases(&self, config: &PluginConfig) -> AppResult<Vec<String>> {
        self.catalog.databases(config).await
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
