pub mod manifest;
pub mod predictor;
pub mod registry;
pub mod shape;

pub use manifest::{Manifest, ManifestEntry};
pub use predictor::{OnnxPredictor, Predictor};
pub use registry::{ModelInfo, ModelRegistry, ModelStatus, RegisteredModel};
pub use shape::InputShape;
