use crate::utils::error::DigitError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 模型清单 (model_info.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub models: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,

    /// 相对于模型目录的文件名
    pub file: String,

    /// 不含batch维度的输入形状，例如 `[28, 28, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<Vec<usize>>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DigitError::ManifestMissing(path.display().to_string()),
            _ => DigitError::Io(e),
        })?;

        serde_json::from_str(&raw)
            .map_err(|e| DigitError::Manifest(format!("{}: {}", path.display(), e)))
    }

    /// 读取失败时退化为空清单，服务照常启动
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::read(path) {
            Ok(manifest) => {
                tracing::info!(
                    "Loaded manifest from {} ({} models)",
                    path.display(),
                    manifest.models.len()
                );
                manifest
            }
            Err(e) => {
                tracing::error!("{}; starting with no models", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_entries_with_optional_shape() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"models": [
                {"name": "CNN", "file": "cnn.onnx", "input_shape": [28, 28, 1]},
                {"name": "mlp", "file": "mlp.onnx"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(manifest.models.len(), 2);
        assert_eq!(manifest.models[0].input_shape, Some(vec![28, 28, 1]));
        assert_eq!(manifest.models[1].input_shape, None);
    }

    #[test]
    fn entries_without_shape_serialize_verbatim() {
        let entry = ManifestEntry {
            name: "mlp".into(),
            file: "mlp.onnx".into(),
            input_shape: None,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({"name": "mlp", "file": "mlp.onnx"})
        );
    }

    #[test]
    fn missing_manifest_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_info.json");

        assert!(matches!(Manifest::read(&path), Err(DigitError::ManifestMissing(_))));
        assert!(Manifest::load_or_empty(&path).models.is_empty());
    }

    #[test]
    fn malformed_manifest_degrades_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"models\": [{{\"name\": 3}}").unwrap();

        assert!(matches!(Manifest::read(file.path()), Err(DigitError::Manifest(_))));
        assert_eq!(Manifest::load_or_empty(file.path()), Manifest::default());
    }
}
