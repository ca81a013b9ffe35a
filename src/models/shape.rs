use crate::image::{NormalizedImage, INPUT_PIXELS, INPUT_SIDE};
use crate::utils::error::DigitError;
use crate::Result;
use ndarray::{ArrayD, IxDyn};

/// 不含batch维度的模型输入形状，元素总数必须为 784
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputShape(Vec<usize>);

impl InputShape {
    /// (28, 28, 1)，卷积网络使用
    pub fn image() -> Self {
        Self(vec![INPUT_SIDE, INPUT_SIDE, 1])
    }

    /// (784,)，全连接网络使用
    pub fn flat() -> Self {
        Self(vec![INPUT_PIXELS])
    }

    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.is_empty() || dims.iter().product::<usize>() != INPUT_PIXELS {
            return Err(DigitError::ModelLoad(format!(
                "input shape {:?} does not hold {} pixels",
                dims, INPUT_PIXELS
            )));
        }
        Ok(Self(dims))
    }

    /// 清单中声明的形状优先；否则按名称约定，`cnn` 使用图像形状，其余展平
    pub fn resolve(name: &str, declared: Option<&[usize]>) -> Result<Self> {
        match declared {
            Some(dims) => Self::new(dims.to_vec()),
            None if name == "cnn" => Ok(Self::image()),
            None => Ok(Self::flat()),
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// 生成 `[1, ...dims]` 的输入张量
    pub fn tensor(&self, image: &NormalizedImage) -> Result<ArrayD<f32>> {
        let mut shape = Vec::with_capacity(self.0.len() + 1);
        shape.push(1);
        shape.extend_from_slice(&self.0);

        ArrayD::from_shape_vec(IxDyn(&shape), image.to_vec())
            .map_err(|e| DigitError::Internal(format!("reshape to {:?} failed: {}", shape, e)))
    }
}
