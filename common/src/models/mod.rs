//! Shared data models for the adapter layer.

pub mod connection;
pub mod graph;
pub mod operation;
pub mod storage;

// Re-export commonly used types
pub use connection::{Credentials, DatabaseType, PluginConfig, Record};
pub use graph::{GraphUnit, GraphUnitRelationship, RelationEdge, RelationshipKind};
pub use operation::{
    ChatArgs, GetRowsArgs, Operation, OperationOutput, OperationRequest, RawExecuteArgs,
    SchemaArgs, StorageUnitArgs, StorageUnitValuesArgs,
};
pub use storage::{ChatMessage, RowSet, StorageUnit, TABLE_TYPE_ATTRIBUTE};
