use crate::utils::error::DigitError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat};

/// 允许的图像容器格式
pub const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

pub struct ImageLoader;

impl ImageLoader {
    /// 拆分可选的 `<header>,` 前缀，返回 (header, base64数据)
    pub fn split_payload(payload: &str) -> (Option<&str>, &str) {
        match payload.split_once(',') {
            Some((header, data)) => (Some(header), data),
            None => (None, payload),
        }
    }

    /// 从base64字符串加载图像
    pub fn from_base64(payload: &str, max_bytes: usize) -> Result<DynamicImage> {
        let (header, data) = Self::split_payload(payload.trim());

        if let Some(header) = header {
            Self::check_media_type(header)?;
        }

        // 兼容按行折断的base64
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let image_bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;

        Self::from_bytes(&image_bytes, max_bytes)
    }

    /// 从字节加载图像，只接受 `ACCEPTED_FORMATS` 中的格式
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.len() > max_bytes {
            return Err(DigitError::FileTooLarge(bytes.len(), max_bytes));
        }

        let format = Self::detect_format(bytes).ok_or_else(|| {
            DigitError::InvalidInput("payload is not a recognizable image".to_string())
        })?;

        if !Self::is_supported_format(format) {
            return Err(DigitError::UnsupportedFormat(format!("{:?}", format)));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        ACCEPTED_FORMATS.contains(&format)
    }

    /// 校验data URI头部声明的媒体类型，例如 `data:image/png;base64`
    fn check_media_type(header: &str) -> Result<()> {
        let Some(rest) = header.strip_prefix("data:") else {
            return Ok(());
        };

        let mime = rest.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if mime.is_empty() {
            return Ok(());
        }

        match ImageFormat::from_mime_type(&mime) {
            Some(format) if Self::is_supported_format(format) => Ok(()),
            _ => Err(DigitError::UnsupportedFormat(mime)),
        }
    }
}
