use crate::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型清单文件 (model_info.json)
    pub manifest_path: PathBuf,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 解码后图像的最大字节数
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout: 60,
            max_request_size: 10 * 1024 * 1024,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// 清单默认位于 `<base_dir>/model_info.json`，模型位于 `<base_dir>/models`
    pub fn new(
        bind_addr: String,
        base_dir: impl Into<PathBuf>,
        manifest_path: Option<PathBuf>,
        models_dir: Option<PathBuf>,
        intra_threads: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let base_dir = base_dir.into();
        let cpu_cores = num_cpus::get();

        let intra_threads = match intra_threads {
            Some(0) => {
                return Err(crate::DigitError::Config(
                    "intra_threads must be at least 1".to_string(),
                ))
            }
            Some(n) => n,
            None => (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
        };

        let onnx_config = OnnxConfig {
            intra_threads,
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            ..ServerConfig::default()
        };

        Ok(Self {
            bind_addr,
            manifest_path: manifest_path.unwrap_or_else(|| base_dir.join("model_info.json")),
            models_dir: models_dir.unwrap_or_else(|| base_dir.join("models")),
            dev_mode,
            onnx_config,
            server_config,
        })
    }

    /// 获取模型文件路径
    pub fn model_path(&self, file: &str) -> PathBuf {
        self.models_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_to_base_dir() {
        let config = Config::new("127.0.0.1:0".into(), "/srv/backend", None, None, Some(2), false)
            .unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("/srv/backend/model_info.json"));
        assert_eq!(config.model_path("cnn.onnx"), PathBuf::from("/srv/backend/models/cnn.onnx"));
        assert_eq!(config.onnx_config.intra_threads, 2);
    }

    #[test]
    fn explicit_paths_override_base_dir() {
        let config = Config::new(
            "127.0.0.1:0".into(),
            ".",
            Some(PathBuf::from("/etc/digits.json")),
            Some(PathBuf::from("/var/models")),
            None,
            true,
        )
        .unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("/etc/digits.json"));
        assert_eq!(config.models_dir, PathBuf::from("/var/models"));
        assert_eq!(config.server_config.request_timeout, 300);
        assert!(config.onnx_config.intra_threads >= 1);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(Config::new("127.0.0.1:0".into(), ".", None, None, Some(0), false).is_err());
    }
}
