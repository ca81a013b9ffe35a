pub mod loader;
pub mod preprocessing;

pub use loader::ImageLoader;
pub use preprocessing::{ImagePreprocessor, NormalizedImage, INPUT_PIXELS, INPUT_SIDE};
