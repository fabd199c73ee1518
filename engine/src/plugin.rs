//! The capability contract every backend adapter implements.

use async_trait::async_trait;

use common::errors::{AppError, AppResult};
use common::models::{
    ChatMessage, DatabaseType, GraphUnit, Operation, PluginConfig, Record, RowSet, StorageUnit,
};

fn unsupported<T>(backend: DatabaseType, operation: Operation) -> AppResult<T> {
    Err(AppError::unsupported(operation, backend))
}

/// Backend adapter.
///
/// Every operation has a default body returning `Unsupported` without
/// connecting; an adapter overrides what it lists in [`capabilities`].
///
/// [`capabilities`]: PluginFunctions::capabilities
#[async_trait]
pub trait PluginFunctions: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Operations this adapter implements.
    fn capabilities(&self) -> &'static [Operation];

    fn supports(&self, operation: Operation) -> bool {
        self.capabilities().contains(&operation)
    }

    async fn is_available(&self, _config: &PluginConfig) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::IsAvailable)
    }

    async fn get_databases(&self, _config: &PluginConfig) -> AppResult<Vec<String>> {
        unsupported(self.database_type(), Operation::GetDatabases)
    }

    async fn get_schema(&self, _config: &PluginConfig) -> AppResult<Vec<String>> {
        unsupported(self.database_type(), Operation::GetSchema)
    }

    async fn get_storage_units(
        &self,
        _config: &PluginConfig,
        _schema: &str,
    ) -> AppResult<Vec<StorageUnit>> {
        unsupported(self.database_type(), Operation::GetStorageUnits)
    }

    async fn get_rows(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
        _filter: &str,
        _page_size: u32,
        _page_offset: u64,
    ) -> AppResult<RowSet> {
        unsupported(self.database_type(), Operation::GetRows)
    }

    async fn raw_execute(&self, _config: &PluginConfig, _query: &str) -> AppResult<RowSet> {
        unsupported(self.database_type(), Operation::RawExecute)
    }

    async fn chat(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _model: &str,
        _previous_conversation: &str,
        _query: &str,
    ) -> AppResult<Vec<ChatMessage>> {
        unsupported(self.database_type(), Operation::Chat)
    }

    async fn add_storage_unit(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
        _fields: &[Record],
    ) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::AddStorageUnit)
    }

    async fn update_storage_unit(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
        _fields: &[Record],
    ) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::UpdateStorageUnit)
    }

    async fn delete_storage_unit(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
    ) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::DeleteStorageUnit)
    }

    async fn add_row(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
        _values: &[Record],
    ) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::AddRow)
    }

    async fn delete_row(
        &self,
        _config: &PluginConfig,
        _schema: &str,
        _storage_unit: &str,
        _values: &[Record],
    ) -> AppResult<bool> {
        unsupported(self.database_type(), Operation::DeleteRow)
    }

    async fn get_graph(&self, _config: &PluginConfig, _schema: &str) -> AppResult<Vec<GraphUnit>> {
        unsupported(self.database_type(), Operation::GetGraph)
    }
}
