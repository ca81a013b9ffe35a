use crate::{
    digit::PredictionResult,
    image::ImagePreprocessor,
    models::ModelRegistry,
    utils::error::DigitError,
    Result,
};
use std::time::Instant;

/// 预测流水线：解码 → 归一化 → 按模型调整形状 → 推理 → argmax
pub struct PredictionPipeline;

impl PredictionPipeline {
    pub fn predict(
        registry: &ModelRegistry,
        model_name: &str,
        image_base64: &str,
        max_image_bytes: usize,
    ) -> Result<PredictionResult> {
        let start_time = Instant::now();
        let model_name = model_name.to_lowercase();

        let model = registry.get(&model_name)?;

        let normalized = ImagePreprocessor::preprocess_base64(image_base64, max_image_bytes)?;
        let input = model.input_shape.tensor(&normalized)?;
        tracing::debug!("Invoking {} with input {:?}", model_name, input.shape());

        let scores = model.predictor.predict(input)?;
        let scores: Vec<f32> = scores.iter().copied().collect();
        let result = Self::top_class(&scores)?;

        tracing::info!(
            "Prediction completed: model={}, class={}, confidence={:.4}, time={:.3}s",
            model_name,
            result.prediction,
            result.confidence,
            start_time.elapsed().as_secs_f32()
        );

        Ok(result)
    }

    /// 取最大分数的下标，相同分数取最先出现的
    pub fn top_class(scores: &[f32]) -> Result<PredictionResult> {
        if scores.is_empty() {
            return Err(DigitError::Inference("Model returned no scores".to_string()));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(DigitError::Inference(
                "Model returned non-finite scores".to_string(),
            ));
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }

        Ok(PredictionResult {
            prediction: best,
            confidence: scores[best],
        })
    }
}
