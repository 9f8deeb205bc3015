pub mod advisor;
pub mod config;
pub mod diagnosis;
pub mod image;
pub mod models;
pub mod training;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::{Config, TrainingConfig};
pub use diagnosis::{Diagnosis, DiagnosisPipeline};
pub use models::{ModelArtifact, PestClassifier};
pub use utils::error::PestError;

pub type Result<T> = std::result::Result<T, PestError>;
