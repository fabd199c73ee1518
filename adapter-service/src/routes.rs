//! 适配器服务路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{execute_operation, get_capabilities, health_check};
use crate::state::AppState;

/// 创建适配器路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/capabilities/{db_type}", get(get_capabilities))
        .route("/api/operations", post(execute_operation))
}
