//! 数据库适配层公共模块
//!
//! 提供所有服务共享的功能：
//! - 统一错误类型与失败分类
//! - 服务配置加载
//! - 适配器数据模型
//! - API 响应包装与中间件
//! - SQL 标识符与谓词校验

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
