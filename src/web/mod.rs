pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{utils::error::PestError, Config, DiagnosisPipeline, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer,
};

/// 请求处理器共享的只读状态
pub struct AppState {
    pub config: Config,
    pub pipeline: DiagnosisPipeline,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config, pipeline: DiagnosisPipeline) -> SharedState {
        Arc::new(Self { config, pipeline })
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型加载失败时拒绝启动
    let pipeline = DiagnosisPipeline::load(&config.model_path)?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        PestError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    let state = AppState::new(config, pipeline);
    let app = create_app(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /              - Web UI");
    tracing::info!("  POST /pestdetection - Multipart image upload");
    tracing::info!("  POST /api/predict   - JSON base64 upload");
    tracing::info!("  GET  /uploads/:name - Uploaded images");
    tracing::info!("  GET  /health        - Health check");
    tracing::info!("  GET  /api/info      - Model information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        PestError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PestError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(state: SharedState) -> Router {
    let server_config = &state.config.server_config;

    Router::new()
        // 识别API
        .route("/pestdetection", post(handlers::upload_handler))
        .route("/api/predict", post(handlers::predict_json_handler))
        // Web UI
        .route("/", get(ui::index_handler))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "classes": state.pipeline.classifier().class_names().len(),
    }))
}

/// 服务信息端点
async fn info_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let artifact = state.pipeline.classifier().artifact();

    Json(json!({
        "service": "Rice Pest Advisor",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": {
            "class_names": artifact.class_names,
            "image_size": artifact.image_size,
            "channel_order": artifact.channel_order,
            "trained_at": artifact.trained_at.to_rfc3339(),
            "metrics": artifact.metrics,
        },
        "known_pests": crate::advisor::PestKind::ALL
            .iter()
            .map(|kind| kind.display_name())
            .collect::<Vec<_>>(),
    }))
}
