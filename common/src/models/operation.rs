//! Logical operation models.
//!
//! [`OperationRequest`] names one operation of the capability contract with
//! its arguments; [`OperationOutput`] is the matching typed success value.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::connection::Record;
use super::graph::GraphUnit;
use super::storage::{ChatMessage, RowSet, StorageUnit};
use crate::errors::AppResult;

/// Every operation an adapter may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Operation {
    IsAvailable,
    GetDatabases,
    GetSchema,
    GetStorageUnits,
    GetRows,
    RawExecute,
    Chat,
    AddStorageUnit,
    UpdateStorageUnit,
    DeleteStorageUnit,
    AddRow,
    DeleteRow,
    GetGraph,
}

impl Operation {
    #[cfg(test)]
    pub(crate) const ALL: [Operation; 13] = [
        Operation::IsAvailable,
        Operation::GetDatabases,
        Operation::GetSchema,
        Operation::GetStorageUnits,
        Operation::GetRows,
        Operation::RawExecute,
        Operation::Chat,
        Operation::AddStorageUnit,
        Operation::UpdateStorageUnit,
        Operation::DeleteStorageUnit,
        Operation::AddRow,
        Operation::DeleteRow,
        Operation::GetGraph,
    ];

    /// Whether the operation changes backend state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::AddStorageUnit
                | Operation::UpdateStorageUnit
                | Operation::DeleteStorageUnit
                | Operation::AddRow
                | Operation::DeleteRow
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Arguments naming a schema.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SchemaArgs {
    #[validate(length(min = 1, message = "schema is required"))]
    pub schema: String,
}

/// Arguments of a paginated row read.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GetRowsArgs {
    #[validate(length(min = 1, message = "schema is required"))]
    pub schema: String,
    #[validate(length(min = 1, message = "storage unit is required"))]
    pub storage_unit: String,
    /// Optional predicate fragment.
    #[serde(default, rename = "where")]
    pub filter: String,
    pub page_size: u32,
    #[serde(default)]
    pub page_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RawExecuteArgs {
    #[validate(length(min = 1, message = "query is required"))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChatArgs {
    pub schema: String,
    pub model: String,
    #[serde(default)]
    pub previous_conversation: String,
    #[validate(length(min = 1, message = "query is required"))]
    pub query: String,
}

/// Arguments naming one storage unit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StorageUnitArgs {
    pub schema: String,
    #[validate(length(min = 1, message = "storage unit is required"))]
    pub storage_unit: String,
}

/// Arguments naming a storage unit together with field or row values.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StorageUnitValuesArgs {
    pub schema: String,
    #[validate(length(min = 1, message = "storage unit is required"))]
    pub storage_unit: String,
    #[serde(default)]
    pub values: Vec<Record>,
}

/// A logical operation with its arguments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationRequest {
    IsAvailable,
    GetDatabases,
    GetSchema,
    GetStorageUnits(SchemaArgs),
    GetRows(GetRowsArgs),
    RawExecute(RawExecuteArgs),
    Chat(ChatArgs),
    AddStorageUnit(StorageUnitValuesArgs),
    UpdateStorageUnit(StorageUnitValuesArgs),
    DeleteStorageUnit(StorageUnitArgs),
    AddRow(StorageUnitValuesArgs),
    DeleteRow(StorageUnitValuesArgs),
    GetGraph(SchemaArgs),
}

impl OperationRequest {
    pub fn operation(&self) -> Operation {
        match self {
            OperationRequest::IsAvailable => Operation::IsAvailable,
            OperationRequest::GetDatabases => Operation::GetDatabases,
            OperationRequest::GetSchema => Operation::GetSchema,
            OperationRequest::GetStorageUnits(_) => Operation::GetStorageUnits,
            OperationRequest::GetRows(_) => Operation::GetRows,
            OperationRequest::RawExecute(_) => Operation::RawExecute,
            OperationRequest::Chat(_) => Operation::Chat,
            OperationRequest::AddStorageUnit(_) => Operation::AddStorageUnit,
            OperationRequest::UpdateStorageUnit(_) => Operation::UpdateStorageUnit,
            OperationRequest::DeleteStorageUnit(_) => Operation::DeleteStorageUnit,
            OperationRequest::AddRow(_) => Operation::AddRow,
            OperationRequest::DeleteRow(_) => Operation::DeleteRow,
            OperationRequest::GetGraph(_) => Operation::GetGraph,
        }
    }

    /// Validates the operation's arguments.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            OperationRequest::IsAvailable
            | OperationRequest::GetDatabases
            | OperationRequest::GetSchema => {}
            OperationRequest::GetStorageUnits(args) | OperationRequest::GetGraph(args) => {
                args.validate()?
            }
            OperationRequest::GetRows(args) => args.validate()?,
            OperationRequest::RawExecute(args) => args.validate()?,
            OperationRequest::Chat(args) => args.validate()?,
            OperationRequest::DeleteStorageUnit(args) => args.validate()?,
            OperationRequest::AddStorageUnit(args)
            | OperationRequest::UpdateStorageUnit(args)
            | OperationRequest::AddRow(args)
            | OperationRequest::DeleteRow(args) => args.validate()?,
        }
        Ok(())
    }
}

/// Typed success value of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OperationOutput {
    Available(bool),
    Databases(Vec<String>),
    Schemas(Vec<String>),
    StorageUnits(Vec<StorageUnit>),
    Rows(RowSet),
    Chat(Vec<ChatMessage>),
    Mutated(bool),
    Graph(Vec<GraphUnit>),
}
