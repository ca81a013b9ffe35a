use crate::{
    digit::{PredictRequest, PredictionPipeline, PredictionResult},
    models::ModelInfo,
    utils::error::DigitError,
    web::{extractors::ValidatedJson, AppState},
    Result,
};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;
use std::sync::Arc;

/// 数字识别处理器
pub async fn predict_handler(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
    ValidatedJson(request): ValidatedJson<PredictRequest>,
) -> Result<Json<PredictionResult>> {
    let registry = Arc::clone(&state.registry);
    let max_image_bytes = state.config.server_config.max_image_bytes;

    // 推理是阻塞调用，放到阻塞线程池执行
    let result = tokio::task::spawn_blocking(move || {
        PredictionPipeline::predict(
            &registry,
            &model_name,
            &request.image_base64,
            max_image_bytes,
        )
    })
    .await
    .map_err(|e| DigitError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(Json(result))
}

/// 模型清单，附带加载状态
pub async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.registry.model_info())
}

/// 健康检查端点
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "models_loaded": state.registry.len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
