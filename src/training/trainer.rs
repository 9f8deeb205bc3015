use crate::config::TrainingConfig;
use crate::image::FeatureExtractor;
use crate::models::{BinaryModel, LinearSvm, ModelArtifact, PlattScaling, TrainingMetrics};
use crate::training::dataset::{FeatureSample, ImageDataset};
use crate::training::split::split_train_test;
use crate::utils::error::PestError;
use crate::Result;
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1};
use std::time::Instant;

/// 训练结果摘要
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub class_names: Vec<String>,
    pub metrics: TrainingMetrics,
    pub elapsed_secs: f32,
}

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// 训练并写出模型文件
    pub fn run(&self) -> Result<(ModelArtifact, TrainingReport)> {
        let (artifact, report) = self.train()?;
        artifact.save(&self.config.output_path)?;
        Ok((artifact, report))
    }

    /// 只训练不落盘
    pub fn train(&self) -> Result<(ModelArtifact, TrainingReport)> {
        self.config.validate()?;
        let start_time = Instant::now();

        let extractor = FeatureExtractor::from_size(self.config.image_size);
        let dataset = ImageDataset::discover(&self.config.dataset_path)?;
        let (samples, skipped) = dataset.load_features(&extractor)?;

        let (train, test) = split_train_test(samples, self.config.split_ratio, self.config.seed);

        tracing::info!(
            "Training linear SVM on {} samples ({} held out)",
            train.len(),
            test.len()
        );
        let classifier = Self::fit(
            &train,
            dataset.num_classes(),
            extractor.feature_len(),
            self.config.c,
        )?;

        let accuracy = accuracy(&classifier, &test);
        if test.is_empty() {
            tracing::warn!("No held-out samples, accuracy was not measured");
        } else {
            tracing::info!("Model accuracy: {:.2}%", accuracy * 100.0);
        }

        let metrics = TrainingMetrics {
            train_samples: train.len(),
            test_samples: test.len(),
            skipped_files: skipped,
            accuracy,
            split_ratio: self.config.split_ratio,
            seed: self.config.seed,
        };

        let artifact = ModelArtifact::new(
            self.config.image_size,
            dataset.class_names.clone(),
            classifier,
            Some(metrics.clone()),
        );

        let report = TrainingReport {
            class_names: dataset.class_names,
            metrics,
            elapsed_secs: start_time.elapsed().as_secs_f32(),
        };

        Ok((artifact, report))
    }

    /// 一对多训练线性核SVM，并把每个模型折叠为权重向量
    pub fn fit(
        samples: &[FeatureSample],
        num_classes: usize,
        dim: usize,
        c: f64,
    ) -> Result<LinearSvm> {
        if samples.is_empty() {
            return Err(PestError::Training("No training samples".to_string()));
        }

        let n = samples.len();
        let mut data = Vec::with_capacity(n * dim);
        for sample in samples {
            if sample.features.len() != dim {
                return Err(PestError::Training(format!(
                    "Inconsistent feature length {}, expected {}",
                    sample.features.len(),
                    dim
                )));
            }
            data.extend(sample.features.iter().map(|v| *v as f64));
        }

        let records = Array2::from_shape_vec((n, dim), data)
            .map_err(|e| PestError::Training(format!("Failed to build feature matrix: {}", e)))?;

        let mut models = Vec::with_capacity(num_classes);
        for class_idx in 0..num_classes {
            let binary_labels: Vec<bool> = samples.iter().map(|s| s.label == class_idx).collect();
            let positives = binary_labels.iter().filter(|&&l| l).count();

            if positives == 0 || positives == n {
                tracing::warn!(
                    "Class {} has {} of {} training samples, using a constant decision function",
                    class_idx,
                    positives,
                    n
                );
                models.push(BinaryModel::constant(dim, positives == n));
                continue;
            }

            let dataset = DatasetBase::new(records.view(), ArrayView1::from(&binary_labels));
            let svm = Svm::<_, bool>::params()
                .pos_neg_weights(c, c)
                .linear_kernel()
                .fit(&dataset)
                .map_err(|e| {
                    PestError::Training(format!("SVM training failed for class {}: {}", class_idx, e))
                })?;

            // w = Σ(αᵢ·xᵢ)，α 已带标签符号
            let mut weights = Array1::<f64>::zeros(dim);
            for (i, &alpha_i) in svm.alpha.iter().enumerate() {
                if alpha_i != 0.0 {
                    weights.scaled_add(alpha_i, &records.row(i));
                }
            }

            let mut model = BinaryModel {
                weights: weights.to_vec(),
                rho: svm.rho,
                platt: PlattScaling::default(),
            };

            let decision_values: Vec<f64> = samples
                .iter()
                .map(|s| model.decision_function(&s.features))
                .collect();
            model.platt = PlattScaling::fit(&decision_values, &binary_labels)?;

            tracing::debug!("Class {}: rho={:.4}", class_idx, model.rho);
            models.push(model);
        }

        Ok(LinearSvm::new(models))
    }
}

/// 测试集上预测正确的比例，空集返回0
pub fn accuracy(classifier: &LinearSvm, samples: &[FeatureSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let correct = samples
        .iter()
        .filter(|s| classifier.predict_index(&s.features) == s.label)
        .count();
    correct as f64 / samples.len() as f64
}
