use crate::utils::error::PestError;
use crate::Result;
use std::path::PathBuf;

/// 训练与推理共用的默认输入尺寸
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (128, 128);

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 上传文件保存目录
    pub upload_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        upload_dir: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let workers = workers.unwrap_or_else(num_cpus::get).max(1);

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 20 * 1024 * 1024,
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            upload_dir: upload_dir.into(),
            workers,
            dev_mode,
            server_config,
        })
    }
}

/// 离线训练配置
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// 数据集根目录，每个子目录是一个类别
    pub dataset_path: PathBuf,

    /// 模型输出路径
    pub output_path: PathBuf,

    /// 特征提取的目标尺寸 (width, height)
    pub image_size: (u32, u32),

    /// 训练集比例
    pub split_ratio: f64,

    /// 划分数据集的随机种子
    pub seed: u64,

    /// SVM惩罚系数
    pub c: f64,
}

impl TrainingConfig {
    pub fn new(dataset_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            output_path: output_path.into(),
            image_size: DEFAULT_IMAGE_SIZE,
            split_ratio: 0.8,
            seed: 42,
            c: 1.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.image_size;
        if width == 0 || height == 0 {
            return Err(PestError::Config(format!(
                "Image size must be non-zero, got {}x{}",
                width, height
            )));
        }

        if !(self.split_ratio > 0.0 && self.split_ratio <= 1.0) {
            return Err(PestError::Config(format!(
                "Split ratio must be in (0, 1], got {}",
                self.split_ratio
            )));
        }

        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(PestError::Config(format!(
                "SVM penalty C must be positive, got {}",
                self.c
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_defaults_match_reference_run() {
        let config = TrainingConfig::new("data", "model.json");
        assert_eq!(config.image_size, (128, 128));
        assert_eq!(config.split_ratio, 0.8);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_split_ratio() {
        let mut config = TrainingConfig::new("data", "model.json");
        config.split_ratio = 1.5;
        assert!(matches!(config.validate(), Err(PestError::Config(_))));

        config.split_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn workers_default_to_at_least_one() {
        let config = Config::new("127.0.0.1:0".into(), "m.json", "uploads", None, false).unwrap();
        assert!(config.workers >= 1);
        assert_eq!(config.server_config.request_timeout, 60);
    }
}
