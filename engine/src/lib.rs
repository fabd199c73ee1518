//! 数据库适配引擎
//!
//! 提供统一的后端能力契约，包括：
//! - 能力表与操作分发
//! - 后端会话获取与释放
//! - 模式与存储单元枚举
//! - 分页行读取
//! - 表关系图推断

pub mod catalog;
pub mod connection;
pub mod dispatcher;
pub mod graph;
pub mod plugin;
pub mod plugins;
pub mod rows;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use plugin::PluginFunctions;
pub use session::{CatalogSession, CellValue, ParamValue, Row, SessionProvider, Statement};
