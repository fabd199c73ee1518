//! Operations shared by adapters that read `information_schema`.
//!
//! Every call acquires one session, runs its queries in order and releases
//! the session before returning, all under the configuration's deadline.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use common::errors::{AppResult, ErrorKind};
use common::models::{DatabaseType, GraphUnit, PluginConfig, RowSet, StorageUnit};

use crate::session::{bounded, collect_rows, release, CatalogSession, SessionProvider, Statement};
use crate::{catalog, graph, rows};

const PROBE_QUERY: &str = "SELECT 1";

pub struct SqlCatalog {
    backend: DatabaseType,
    provider: Arc<dyn SessionProvider>,
}

impl SqlCatalog {
    pub fn new(backend: DatabaseType, provider: Arc<dyn SessionProvider>) -> Self {
        Self { backend, provider }
    }

    /// Acquires a session, runs `op` on it and releases it.
    ///
    /// The session is released whether `op` succeeds or fails; only deadline
    /// expiry drops it unreleased.
    async fn with_session<T, F>(&self, config: &PluginConfig, op: F) -> AppResult<T>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut dyn CatalogSession) -> BoxFuture<'s, AppResult<T>> + Send,
    {
        bounded(config, async {
            let mut session = self.provider.acquire(config).await?;
            let result = op(session.as_mut()).await;
            release(session).await;
            result
        })
        .await
    }

    /// Connects and runs a trivial query.
    ///
    /// A connection failure reads as "not available"; other failures propagate.
    pub async fn is_available(&self, config: &PluginConfig) -> AppResult<bool> {
        let probe = self
            .with_session(config, |session| {
                async move { collect_rows(session, &Statement::new(PROBE_QUERY)).await }.boxed()
            })
            .await;

        match probe {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::ConnectionFailure => {
                tracing::debug!(backend = %self.backend, error = %e, "backend unavailable");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn schemas(&self, config: &PluginConfig) -> AppResult<Vec<String>> {
        self.with_session(config, |session| catalog::list_schemas(session).boxed())
            .await
    }

    pub async fn databases(&self, config: &PluginConfig) -> AppResult<Vec<String>> {
        self.with_session(config, |session| catalog::list_databases(session).boxed())
            .await
    }

    pub async fn storage_units(
        &self,
        config: &PluginConfig,
        schema: &str,
    ) -> AppResult<Vec<StorageUnit>> {
        let schema = schema.to_string();
        self.with_session(config, move |session| {
            async move { catalog::list_storage_units(session, &schema).await }.boxed()
        })
        .await
    }

    pub async fn rows(
        &self,
        config: &PluginConfig,
        schema: &str,
        storage_unit: &str,
        filter: &str,
        page_size: u32,
        page_offset: u64,
    ) -> AppResult<RowSet> {
        // Reject malformed identifiers and filters before connecting.
        rows::rows_statement(schema, storage_unit, filter, page_size, page_offset)?;

        let (schema, storage_unit, filter) =
            (schema.to_string(), storage_unit.to_string(), filter.to_string());
        self.with_session(config, move |session| {
            async move {
                rows::get_rows(session, &schema, &storage_unit, &filter, page_size, page_offset)
                    .await
            }
            .boxed()
        })
        .await
    }

    pub async fn graph(&self, config: &PluginConfig, schema: &str) -> AppResult<Vec<GraphUnit>> {
        let schema = schema.to_string();
        self.with_session(config, move |session| {
            async move { graph::get_graph(session, &schema).await }.boxed()
        })
        .await
    }
}
