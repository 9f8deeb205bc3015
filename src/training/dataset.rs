//! 训练数据集：根目录下每个子目录是一个类别
//!
//! ```text
//! dataset/
//! ├── Green Leafhopper/
//! │   ├── 001.jpg
//! │   └── 002.jpg
//! ├── Rice Bug/
//! └── ...
//! ```
//!
//! 类别索引按子目录名称的字典序分配，与文件系统的枚举顺序无关。

use crate::image::FeatureExtractor;
use crate::utils::error::PestError;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 带标签的样本文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub path: PathBuf,
    pub label: usize,
}

/// 解码后的样本
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSample {
    pub features: Vec<f32>,
    pub label: usize,
}

#[derive(Debug, Clone)]
pub struct ImageDataset {
    pub root_dir: PathBuf,
    pub class_names: Vec<String>,
    pub samples: Vec<LabeledImage>,
}

impl ImageDataset {
    pub fn discover(root_dir: &Path) -> Result<Self> {
        tracing::info!("Scanning dataset at {}", root_dir.display());

        if !root_dir.is_dir() {
            return Err(PestError::Dataset(format!(
                "Dataset directory does not exist: {}",
                root_dir.display()
            )));
        }

        let mut class_names = Vec::new();
        for entry in fs::read_dir(root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => class_names.push(name),
                Err(name) => tracing::warn!("Skipping non UTF-8 class directory {:?}", name),
            }
        }
        class_names.sort();

        if class_names.len() < 2 {
            return Err(PestError::Dataset(format!(
                "Expected at least 2 class subdirectories in {}, found {}",
                root_dir.display(),
                class_names.len()
            )));
        }

        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = root_dir.join(class_name);
            // 只取类别目录的直接子文件
            let files: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();

            tracing::debug!("Class '{}' (label {}): {} files", class_name, label, files.len());
            samples.extend(files.into_iter().map(|path| LabeledImage { path, label }));
        }

        if samples.is_empty() {
            return Err(PestError::Dataset(format!(
                "No image files found under {}",
                root_dir.display()
            )));
        }

        tracing::info!(
            "Found {} classes and {} files",
            class_names.len(),
            samples.len()
        );

        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            class_names,
            samples,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// 解码并提取特征，解码失败的文件记录日志后跳过
    ///
    /// 返回 (样本, 跳过的文件数)
    pub fn load_features(&self, extractor: &FeatureExtractor) -> Result<(Vec<FeatureSample>, usize)> {
        let mut features = Vec::with_capacity(self.samples.len());
        let mut skipped = 0;

        for sample in &self.samples {
            match extractor.extract_path(&sample.path) {
                Ok(vector) => features.push(FeatureSample {
                    features: vector,
                    label: sample.label,
                }),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping {}: {}", sample.path.display(), e);
                }
            }
        }

        if features.is_empty() {
            return Err(PestError::Dataset(format!(
                "None of the {} files under {} could be decoded",
                self.samples.len(),
                self.root_dir.display()
            )));
        }

        tracing::info!(
            "Dataset loaded: {} images, {} skipped",
            features.len(),
            skipped
        );
        Ok((features, skipped))
    }
}
