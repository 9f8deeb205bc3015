use crate::image::ImageLoader;
use crate::Result;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 训练与推理必须使用同一种重采样算法
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// 特征向量中的通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
}

impl ChannelOrder {
    pub const CHANNELS: usize = 3;
}

/// 图像特征提取器：缩放、展平、归一化到 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureExtractor {
    width: u32,
    height: u32,
}

impl FeatureExtractor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_size((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }

    /// 特征向量长度 = width * height * channels
    pub fn feature_len(&self) -> usize {
        self.width as usize * self.height as usize * ChannelOrder::CHANNELS
    }

    /// 按行展平 (y, x, c)
    pub fn extract(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = image.to_rgb8();
        let resized = if rgb.dimensions() == (self.width, self.height) {
            rgb
        } else {
            imageops::resize(&rgb, self.width, self.height, RESIZE_FILTER)
        };

        resized
            .into_raw()
            .into_iter()
            .map(|value| value as f32 / 255.0)
            .collect()
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = ImageLoader::from_bytes(bytes)?;
        Ok(self.extract(&image))
    }

    pub fn extract_path(&self, path: &Path) -> Result<Vec<f32>> {
        let image = ImageLoader::from_path(path)?;
        Ok(self.extract(&image))
    }
}
