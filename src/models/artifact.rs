use crate::image::{ChannelOrder, FeatureExtractor};
use crate::models::classifier::LinearSvm;
use crate::utils::error::PestError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// 训练时记录的评估信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_samples: usize,
    pub test_samples: usize,
    pub skipped_files: usize,
    pub accuracy: f64,
    pub split_ratio: f64,
    pub seed: u64,
}

impl TrainingMetrics {
    /// 没有留出样本时准确率未被测量
    pub fn measured_accuracy(&self) -> Option<f64> {
        (self.test_samples > 0).then_some(self.accuracy)
    }
}

/// 模型文件：分类器与按索引排列的类别名称必须一起保存、一起加载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub image_size: ImageSize,
    pub channel_order: ChannelOrder,
    pub class_names: Vec<String>,
    pub classifier: LinearSvm,
    pub trained_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TrainingMetrics>,
}

impl ModelArtifact {
    pub fn new(
        image_size: (u32, u32),
        class_names: Vec<String>,
        classifier: LinearSvm,
        metrics: Option<TrainingMetrics>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            image_size: image_size.into(),
            channel_order: ChannelOrder::Rgb,
            class_names,
            classifier,
            trained_at: Utc::now(),
            metrics,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PestError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading model artifact from: {}", path.display());

        let bytes = fs::read(path).map_err(|e| {
            PestError::ModelLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes).map_err(|e| {
            PestError::ModelLoad(format!("Malformed model file {}: {}", path.display(), e))
        })?;
        artifact.validate()?;

        tracing::info!(
            "Model loaded: {} classes, input {}x{}",
            artifact.class_names.len(),
            artifact.image_size.width,
            artifact.image_size.height
        );
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(self)?;
        fs::write(path, json)?;
        tracing::info!("Model saved to {}", path.display());
        Ok(())
    }

    /// 加载后的一致性检查，任何不一致都视为模型损坏
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PestError::ModelLoad(format!(
                "Unsupported model format version {}, expected {}",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        if self.class_names.is_empty() {
            return Err(PestError::ModelLoad("Model has no class names".to_string()));
        }

        if self.classifier.num_classes() != self.class_names.len() {
            return Err(PestError::ModelLoad(format!(
                "Model has {} classifiers but {} class names",
                self.classifier.num_classes(),
                self.class_names.len()
            )));
        }

        let expected = FeatureExtractor::from_size(self.image_size.as_tuple()).feature_len();
        if expected == 0 {
            return Err(PestError::ModelLoad("Model image size is zero".to_string()));
        }
        for (idx, model) in self.classifier.models.iter().enumerate() {
            if model.weights.len() != expected {
                return Err(PestError::ModelLoad(format!(
                    "Classifier {} ('{}') has {} weights, expected {}",
                    idx,
                    self.class_names[idx],
                    model.weights.len(),
                    expected
                )));
            }
        }

        Ok(())
    }
}
