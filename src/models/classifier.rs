use crate::image::FeatureExtractor;
use crate::models::artifact::ModelArtifact;
use crate::models::calibration::PlattScaling;
use crate::utils::error::PestError;
use crate::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 单个一对多二分类器：f(x) = w·x - rho
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryModel {
    pub weights: Vec<f64>,
    pub rho: f64,
    #[serde(default)]
    pub platt: PlattScaling,
}

impl BinaryModel {
    /// 训练集中缺少正例或负例时使用的常数判别函数
    pub fn constant(dim: usize, positive: bool) -> Self {
        Self {
            weights: vec![0.0; dim],
            rho: if positive { -1.0 } else { 1.0 },
            platt: PlattScaling::default(),
        }
    }

    #[inline]
    pub fn decision_function(&self, features: &[f32]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * f64::from(*x))
            .sum::<f64>()
            - self.rho
    }
}

/// 线性SVM多分类器（一对多），第 i 个模型对应类别索引 i
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    pub models: Vec<BinaryModel>,
}

impl LinearSvm {
    pub fn new(models: Vec<BinaryModel>) -> Self {
        Self { models }
    }

    pub fn num_classes(&self) -> usize {
        self.models.len()
    }

    pub fn decision_values(&self, features: &[f32]) -> Vec<f64> {
        self.models
            .iter()
            .map(|m| m.decision_function(features))
            .collect()
    }

    /// 判别值最大的类别索引
    pub fn predict_index(&self, features: &[f32]) -> usize {
        argmax(&self.decision_values(features))
    }

    /// 各类别的Platt概率，归一化后和为1
    pub fn probabilities(&self, decision_values: &[f64]) -> Vec<f64> {
        let raw: Vec<f64> = self
            .models
            .iter()
            .zip(decision_values)
            .map(|(m, &f)| m.platt.probability(f))
            .collect();

        let total: f64 = raw.iter().sum();
        if total > 0.0 && total.is_finite() {
            raw.into_iter().map(|p| p / total).collect()
        } else {
            vec![1.0 / raw.len().max(1) as f64; raw.len()]
        }
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_idx, best), (idx, &v)| {
            if v > best {
                (idx, v)
            } else {
                (best_idx, best)
            }
        })
        .0
}

/// 单张图像的预测结果
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

/// 推理服务：持有只读模型与同尺寸的特征提取器
#[derive(Debug, Clone)]
pub struct PestClassifier {
    artifact: ModelArtifact,
    extractor: FeatureExtractor,
}

impl PestClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        let extractor = FeatureExtractor::from_size(artifact.image_size.as_tuple());
        Ok(Self {
            artifact,
            extractor,
        })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn class_names(&self) -> &[String] {
        &self.artifact.class_names
    }

    pub fn predict_features(&self, features: &[f32]) -> Result<Prediction> {
        let expected = self.extractor.feature_len();
        if features.len() != expected {
            return Err(PestError::InvalidInput(format!(
                "Feature vector has length {}, expected {}",
                features.len(),
                expected
            )));
        }

        let classifier = &self.artifact.classifier;
        let decision_values = classifier.decision_values(features);
        let index = argmax(&decision_values);
        let probabilities = classifier.probabilities(&decision_values);

        let label = self
            .artifact
            .class_names
            .get(index)
            .cloned()
            .ok_or_else(|| PestError::Internal(format!("Class index {} out of range", index)))?;

        Ok(Prediction {
            index,
            label,
            confidence: probabilities.get(index).copied().unwrap_or(0.0),
            probabilities,
        })
    }

    pub fn predict_image(&self, image: &DynamicImage) -> Result<Prediction> {
        let features = self.extractor.extract(image);
        self.predict_features(&features)
    }
}
