use crate::image::ImageLoader;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use ndarray::Array2;

/// 模型输入边长
pub const INPUT_SIDE: usize = 28;

/// 单张图像的像素总数 (28 * 28)
pub const INPUT_PIXELS: usize = INPUT_SIDE * INPUT_SIDE;

/// 归一化后的 28x28 灰度图，取值范围 [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: Array2<f32>,
}

impl NormalizedImage {
    pub fn pixels(&self) -> &Array2<f32> {
        &self.pixels
    }

    /// 按行优先顺序展开的像素
    pub fn to_vec(&self) -> Vec<f32> {
        self.pixels.iter().copied().collect()
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// base64 → 灰度 → 28x28 → /255
    pub fn preprocess_base64(payload: &str, max_image_bytes: usize) -> Result<NormalizedImage> {
        let image = ImageLoader::from_base64(payload, max_image_bytes)?;
        Ok(Self::normalize(&image))
    }

    pub fn normalize(image: &DynamicImage) -> NormalizedImage {
        let gray = Self::to_grayscale(image);

        let side = INPUT_SIDE as u32;
        let resized = if gray.dimensions() == (side, side) {
            gray
        } else {
            image::imageops::resize(&gray, side, side, FilterType::Lanczos3)
        };

        let pixels = Array2::from_shape_fn((INPUT_SIDE, INPUT_SIDE), |(y, x)| {
            resized.get_pixel(x as u32, y as u32)[0] as f32 / 255.0
        });

        NormalizedImage { pixels }
    }

    /// ITU-R 601-2 亮度转换 (L = R*299/1000 + G*587/1000 + B*114/1000)，alpha通道直接丢弃
    fn to_grayscale(image: &DynamicImage) -> GrayImage {
        if let DynamicImage::ImageLuma8(gray) = image {
            return gray.clone();
        }

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut gray = GrayImage::new(width, height);

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000;
            gray.put_pixel(x, y, Luma([luma.min(255) as u8]));
        }

        gray
    }
}
