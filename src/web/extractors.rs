use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// 验证的JSON提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| ValidationError::JsonParse(err.body_text()))?;

        value.validate().map_err(ValidationError::Validation)?;

        Ok(ValidatedJson(value))
    }
}

/// 验证trait
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// 验证错误类型
#[derive(Debug)]
pub enum ValidationError {
    JsonParse(String),
    Validation(String),
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        tracing::warn!("Request body rejected: {}", self);

        let body = serde_json::json!({ "detail": self.to_string() });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::JsonParse(msg) => write!(f, "JSON parse error: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Validate for crate::digit::PredictRequest {
    fn validate(&self) -> Result<(), String> {
        if self.image_base64.trim().is_empty() {
            return Err("image_base64 cannot be empty".to_string());
        }
        Ok(())
    }
}
