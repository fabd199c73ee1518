//! Handler模块

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{DatabaseType, Operation, OperationOutput, OperationRequest, PluginConfig};
use common::response::ApiResponse;

use crate::state::AppState;
use crate::SERVICE_NAME;

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// 查询适配器能力表
#[utoipa::path(
    get,
    path = "/api/capabilities/{db_type}",
    tag = "adapters",
    params(
        ("db_type" = String, Path, description = "数据库类型 (spanner, postgres, redis)")
    ),
    responses(
        (status = 200, description = "适配器支持的操作", body = ApiResponse<CapabilitiesResponse>),
        (status = 400, description = "未知的数据库类型")
    )
)]
pub async fn get_capabilities(
    State(state): State<AppState>,
    Path(db_type): Path<String>,
) -> Result<Json<ApiResponse<CapabilitiesResponse>>, AppError> {
    let db_type: DatabaseType = db_type.parse().map_err(AppError::InvalidArgument)?;
    let operations = state.dispatcher.capabilities(db_type)?.to_vec();
    Ok(Json(ApiResponse::ok_with_service(
        CapabilitiesResponse {
            db_type,
            operations,
        },
        SERVICE_NAME,
    )))
}

/// 执行一次适配器操作
///
/// 请求未携带 `timeout_ms` 时使用服务配置的默认超时。
#[utoipa::path(
    post,
    path = "/api/operations",
    tag = "adapters",
    request_body = OperationBody,
    responses(
        (status = 200, description = "操作结果", body = ApiResponse<OperationOutput>),
        (status = 400, description = "参数无效"),
        (status = 422, description = "查询失败"),
        (status = 501, description = "适配器不支持该操作"),
        (status = 503, description = "数据库连接失败"),
        (status = 504, description = "操作超时")
    )
)]
pub async fn execute_operation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<OperationBody>,
) -> Result<Json<ApiResponse<OperationOutput>>, AppError> {
    let OperationBody {
        mut config,
        request,
    } = body;
    if config.timeout_ms.is_none() {
        config = config.with_timeout(state.config.query_timeout());
    }

    let start = std::time::Instant::now();
    let output = state.dispatcher.dispatch(&config, &request).await?;

    Ok(Json(
        ApiResponse::ok_with_service(output, SERVICE_NAME)
            .with_request_id(request_id.as_str())
            .with_duration(start.elapsed().as_millis() as u64),
    ))
}

/// 操作请求体
#[derive(Debug, Deserialize, ToSchema)]
pub struct OperationBody {
    /// 目标数据库配置
    pub config: PluginConfig,
    /// 操作及其参数
    pub request: OperationRequest,
}

/// 适配器能力表
#[derive(Serialize, ToSchema)]
pub struct CapabilitiesResponse {
    /// 数据库类型
    pub db_type: DatabaseType,
    /// 支持的操作
    pub operations: Vec<Operation>,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}
