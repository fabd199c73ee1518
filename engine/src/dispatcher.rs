//! Routes logical operations to the adapter registered for a backend type.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::models::{DatabaseType, Operation, OperationOutput, OperationRequest, PluginConfig};

use crate::plugin::PluginFunctions;
use crate::plugins::{PostgresPlugin, RedisPlugin, SpannerPlugin};

/// Adapter registry keyed by backend type.
#[derive(Default, Clone)]
pub struct Dispatcher {
    plugins: HashMap<DatabaseType, Arc<dyn PluginFunctions>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the shipped adapters.
    pub fn with_default_plugins(connect_timeout: Duration) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(SpannerPlugin::new(connect_timeout)));
        dispatcher.register(Arc::new(PostgresPlugin::new(connect_timeout)));
        dispatcher.register(Arc::new(RedisPlugin::new(connect_timeout)));
        dispatcher
    }

    /// Registers `plugin`, replacing any adapter for the same backend type.
    pub fn register(&mut self, plugin: Arc<dyn PluginFunctions>) {
        self.plugins.insert(plugin.database_type(), plugin);
    }

    pub fn plugin(&self, db_type: DatabaseType) -> AppResult<&Arc<dyn PluginFunctions>> {
        self.plugins.get(&db_type).ok_or_else(|| {
            AppError::InvalidArgument(format!("no adapter registered for {}", db_type))
        })
    }

    pub fn capabilities(&self, db_type: DatabaseType) -> AppResult<&'static [Operation]> {
        Ok(self.plugin(db_type)?.capabilities())
    }

    /// Executes `request` against the adapter selected by the credentials.
    ///
    /// Operations outside the adapter's capability table fail with
    /// `Unsupported` before arguments are validated or a session is opened.
    pub async fn dispatch(
        &self,
        config: &PluginConfig,
        request: &OperationRequest,
    ) -> AppResult<OperationOutput> {
        let backend = config.db_type();
        let operation = request.operation();
        let plugin = self.plugin(backend)?;

        if !plugin.supports(operation) {
            tracing::debug!(%backend, %operation, "operation not in capability table");
            return Err(AppError::unsupported(operation, backend));
        }
        request.validate()?;

        let start = std::time::Instant::now();
        let result = run(plugin.as_ref(), config, request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(%backend, %operation, elapsed_ms, "operation completed"),
            Err(e) => tracing::warn!(
                %backend,
                %operation,
                elapsed_ms,
                code = e.kind().code(),
                error = %e,
                "operation failed"
            ),
        }
        result
    }
}

async fn run(
    plugin: &dyn PluginFunctions,
    config: &PluginConfig,
    request: &OperationRequest,
) -> AppResult<OperationOutput> {
    let output = match request {
        OperationRequest::IsAvailable => OperationOutput::Available(plugin.is_available(config).await?),
        OperationRequest::GetDatabases => {
            OperationOutput::Databases(plugin.get_databases(config).await?)
        }
        OperationRequest::GetSchema => OperationOutput::Schemas(plugin.get_schema(config).await?),
        OperationRequest::GetStorageUnits(args) => {
            OperationOutput::StorageUnits(plugin.get_storage_units(config, &args.schema).await?)
        }
        OperationRequest::GetRows(args) => OperationOutput::Rows(
            plugin
                .get_rows(
                    config,
                    &args.schema,
                    &args.storage_unit,
                    &args.filter,
                    args.page_size,
                    args.page_offset,
                )
                .await?,
        ),
        OperationRequest::RawExecute(args) => {
            OperationOutput::Rows(plugin.raw_execute(config, &args.query).await?)
        }
        OperationRequest::Chat(args) => OperationOutput::Chat(
            plugin
                .chat(
                    config,
                    &args.schema,
                    &args.model,
                    &args.previous_conversation,
                    &args.query,
                )
                .await?,
        ),
        OperationRequest::AddStorageUnit(args) => OperationOutput::Mutated(
            plugin
                .add_storage_unit(config, &args.schema, &args.storage_unit, &args.values)
                .await?,
        ),
        OperationRequest::UpdateStorageUnit(args) => OperationOutput::Mutated(
            plugin
                .update_storage_unit(config, &args.schema, &args.storage_unit, &args.values)
                .await?,
        ),
        OperationRequest::DeleteStorageUnit(args) => OperationOutput::Mutated(
            plugin
                .delete_storage_unit(config, &args.schema, &args.storage_unit)
                .await?,
        ),
        OperationRequest::AddRow(args) => OperationOutput::Mutated(
            plugin
                .add_row(config, &args.schema, &args.storage_unit, &args.values)
                .await?,
        ),
        OperationRequest::DeleteRow(args) => OperationOutput::Mutated(
            plugin
                .delete_row(config, &args.schema, &args.storage_unit, &args.values)
                .await?,
        ),
        OperationRequest::GetGraph(args) => {
            OperationOutput::Graph(plugin.get_graph(config, &args.schema).await?)
        }
    };
    Ok(output)
}
