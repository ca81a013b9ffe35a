use crate::config::OnnxConfig;
use crate::utils::error::DigitError;
use crate::Result;
use ndarray::ArrayD;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 已加载的模型，输入 `[1, ...]` 张量，输出各类别分数
pub trait Predictor: Send + Sync {
    fn predict(&self, input: ArrayD<f32>) -> Result<ArrayD<f32>>;
}

/// 基于ONNX Runtime会话的预测器
pub struct OnnxPredictor {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxPredictor {
    pub fn new(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(DigitError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(optimization_level(onnx_config.optimization_level))?
            .with_intra_threads(onnx_config.intra_threads)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DigitError::ModelLoad("Model has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| DigitError::ModelLoad("Model has no outputs".to_string()))?;

        tracing::debug!("Model io: input='{}' output='{}'", input_name, output_name);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, input: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        // 立即提取数据避免生命周期冲突
        let scores = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            let scores = match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(DigitError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            };
            scores
        };

        Ok(scores)
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_fails_before_session() {
        let config = OnnxConfig {
            intra_threads: 1,
            optimization_level: 3,
        };
        let err = OnnxPredictor::new(Path::new("/nonexistent/mlp.onnx"), &config)
            .err()
            .unwrap();
        assert!(matches!(err, DigitError::ModelLoad(_)));
    }
}
