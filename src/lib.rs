pub mod config;
pub mod digit;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use digit::PredictionResult;
pub use utils::error::DigitError;

pub type Result<T> = std::result::Result<T, DigitError>;
