use crate::models::{InputShape, Manifest, ManifestEntry, OnnxPredictor, Predictor};
use crate::utils::error::DigitError;
use crate::{Config, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// 已成功加载的模型
#[derive(Clone)]
pub struct RegisteredModel {
    pub predictor: Arc<dyn Predictor>,
    pub input_shape: InputShape,
    /// 对应的清单条目下标，手动注册且清单中无同名条目时为 None
    pub manifest_index: Option<usize>,
}

/// 启动时构建、之后只读的模型注册表，键为小写模型名
pub struct ModelRegistry {
    manifest: Manifest,
    models: HashMap<String, RegisteredModel>,
}

/// `/model_info` 中的一项：清单条目加上加载状态
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    #[serde(flatten)]
    pub entry: ManifestEntry,
    pub loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub models: Vec<ModelStatus>,
}

impl ModelRegistry {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            models: HashMap::new(),
        }
    }

    /// 读取清单并逐个加载模型，单个模型失败不影响其余模型
    pub fn load(config: &Config) -> Self {
        tracing::info!("Initializing model registry...");

        let manifest = Manifest::load_or_empty(&config.manifest_path);
        let entries = manifest.models.clone();
        let mut registry = Self::new(manifest);

        for (index, entry) in entries.iter().enumerate() {
            let result = Self::load_entry(config, entry)
                .and_then(|(shape, predictor)| registry.insert_entry(index, shape, predictor));

            match result {
                Ok(()) => tracing::info!("Successfully loaded {}", entry.name),
                Err(e) => tracing::error!("Error loading {}: {}", entry.name, e),
            }
        }

        tracing::info!(
            "Model registry initialized: {}/{} models loaded",
            registry.len(),
            entries.len()
        );
        registry
    }

    fn load_entry(
        config: &Config,
        entry: &ManifestEntry,
    ) -> Result<(InputShape, Arc<dyn Predictor>)> {
        let shape = InputShape::resolve(&entry.name.to_lowercase(), entry.input_shape.as_deref())?;
        let path = config.model_path(&entry.file);
        let predictor: Arc<dyn Predictor> =
            Arc::new(OnnxPredictor::new(&path, &config.onnx_config)?);

        tracing::debug!("Model {} expects input {:?}", entry.name, shape.dims());
        Ok((shape, predictor))
    }

    /// 按名称注册模型，关联到清单中第一个同名条目
    pub fn insert(
        &mut self,
        name: &str,
        input_shape: InputShape,
        predictor: Arc<dyn Predictor>,
    ) -> Result<()> {
        let key = name.to_lowercase();
        let manifest_index = self
            .manifest
            .models
            .iter()
            .position(|entry| entry.name.to_lowercase() == key);
        self.register(key, manifest_index, input_shape, predictor)
    }

    /// 为第 `index` 个清单条目注册模型
    pub fn insert_entry(
        &mut self,
        index: usize,
        input_shape: InputShape,
        predictor: Arc<dyn Predictor>,
    ) -> Result<()> {
        let key = self
            .manifest
            .models
            .get(index)
            .map(|entry| entry.name.to_lowercase())
            .ok_or_else(|| {
                DigitError::ModelLoad(format!("no manifest entry at index {}", index))
            })?;
        self.register(key, Some(index), input_shape, predictor)
    }

    /// 同名（忽略大小写）时保留先注册的
    fn register(
        &mut self,
        key: String,
        manifest_index: Option<usize>,
        input_shape: InputShape,
        predictor: Arc<dyn Predictor>,
    ) -> Result<()> {
        if self.models.contains_key(&key) {
            return Err(DigitError::ModelLoad(format!(
                "duplicate model name '{}'",
                key
            )));
        }

        self.models.insert(
            key,
            RegisteredModel {
                predictor,
                input_shape,
                manifest_index,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredModel> {
        self.models
            .get(&name.to_lowercase())
            .ok_or_else(|| DigitError::ModelNotFound(name.to_string()))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.models.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// 清单条目按原顺序返回，并标注是否加载成功
    pub fn model_info(&self) -> ModelInfo {
        let models = self
            .manifest
            .models
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                // 只有实际注册进来的那个条目算作已加载
                let loaded = self
                    .models
                    .get(&entry.name.to_lowercase())
                    .is_some_and(|model| model.manifest_index == Some(index));
                ModelStatus {
                    entry: entry.clone(),
                    loaded,
                }
            })
            .collect();

        ModelInfo { models }
    }
}
