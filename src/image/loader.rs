use crate::utils::error::PestError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// 单张图像的最大字节数
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        let image_bytes = Self::decode_base64(base64_data)?;
        Self::from_bytes(&image_bytes)
    }

    /// 解码base64，兼容数据URL前缀 (data:image/xxx;base64,)
    pub fn decode_base64(base64_data: &str) -> Result<Vec<u8>> {
        let trimmed = base64_data.trim();
        let base64_clean = if trimmed.starts_with("data:") {
            trimmed.split_once(',').map(|(_, data)| data).unwrap_or(trimmed)
        } else {
            trimmed
        };

        Ok(base64::engine::general_purpose::STANDARD.decode(base64_clean)?)
    }

    /// 从字节加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PestError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        let image = image::load_from_memory(bytes)?;
        Ok(image)
    }

    /// 从文件路径加载图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = image::open(path)?;
        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 图像格式对应的文件扩展名
    pub fn extension_for(format: ImageFormat) -> &'static str {
        format.extensions_str().first().copied().unwrap_or("img")
    }
}
