//! 统一数据库适配器服务
//!
//! 通过 HTTP 暴露适配器能力契约，包括：
//! - 能力表查询
//! - 元数据枚举与分页读取
//! - 关系图推断

mod handlers;
mod routes;
mod state;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig, LogFormat};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

pub(crate) const SERVICE_NAME: &str = "adapter-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "适配器服务 API",
        version = "0.1.0",
        description = "统一数据库适配器与关系图推断服务"
    ),
    paths(
        handlers::health_check,
        handlers::get_capabilities,
        handlers::execute_operation,
    ),
    components(schemas(
        common::models::Credentials,
        common::models::DatabaseType,
        common::models::GraphUnit,
        common::models::GraphUnitRelationship,
        common::models::Operation,
        common::models::OperationOutput,
        common::models::OperationRequest,
        common::models::PluginConfig,
        common::models::Record,
        common::models::RelationshipKind,
        common::models::RowSet,
        common::models::StorageUnit,
        handlers::CapabilitiesResponse,
        handlers::HealthResponse,
        handlers::OperationBody,
    )),
    tags(
        (name = "adapters", description = "适配器操作端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 初始化日志追踪
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    let state = AppState::new(config.clone());
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        query_timeout_secs = config.query_timeout_secs,
        "启动服务"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
