pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{models::ModelRegistry, utils::error::DigitError, Config, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 处理器共享的只读状态
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(registry: ModelRegistry, config: Config) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 启动时一次性加载全部模型
    let registry = ModelRegistry::load(&config);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        DigitError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    let app = create_app(AppState::new(registry, config));

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict/:model_name - Predict a digit from a base64 image");
    tracing::info!("  GET  /model_info          - Model manifest with load status");
    tracing::info!("  GET  /health              - Health check");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DigitError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DigitError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route("/predict/:model_name", post(handlers::predict_handler))
        .route("/model_info", get(handlers::model_info_handler))
        .route("/health", get(handlers::health_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
