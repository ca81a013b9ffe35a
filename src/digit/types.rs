use serde::{Deserialize, Serialize};

/// `/predict/{model_name}` 请求体
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// Base64编码的图像，可带 `data:image/png;base64,` 前缀
    pub image_base64: String,
}

/// 预测结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 分数最高的类别下标
    pub prediction: usize,
    /// 该类别的原始分数
    pub confidence: f32,
}
