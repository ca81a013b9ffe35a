use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitError {
    #[error("Manifest not found: {0}")]
    ManifestMissing(String),

    #[error("Manifest is malformed: {0}")]
    Manifest(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DigitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DigitError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            DigitError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DigitError::Base64(_) => StatusCode::BAD_REQUEST,
            DigitError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            DigitError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            DigitError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DigitError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DigitError::ManifestMissing(_) => "MANIFEST_MISSING",
            DigitError::Manifest(_) => "MANIFEST_ERROR",
            DigitError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            DigitError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            DigitError::Inference(_) => "INFERENCE_ERROR",
            DigitError::InvalidInput(_) => "INVALID_INPUT",
            DigitError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            DigitError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            DigitError::Config(_) => "CONFIG_ERROR",
            DigitError::Io(_) => "IO_ERROR",
            DigitError::Json(_) => "JSON_ERROR",
            DigitError::Base64(_) => "BASE64_DECODE_ERROR",
            DigitError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            DigitError::Ort(_) => "ORT_ERROR",
            DigitError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回给客户端的错误描述
    pub fn detail(&self) -> String {
        match self {
            // 客户端依赖这个固定文本
            DigitError::ModelNotFound(_) => "Model not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for DigitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "detail": self.detail() });

        if status.is_client_error() {
            tracing::warn!("Request rejected: {} ({}, {})", self, self.error_code(), status);
        } else {
            tracing::error!("Request failed: {} ({}, {})", self, self.error_code(), status);
        }

        (status, axum::Json(body)).into_response()
    }
}
