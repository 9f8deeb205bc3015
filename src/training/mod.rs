pub mod dataset;
pub mod split;
pub mod trainer;

pub use dataset::{FeatureSample, ImageDataset, LabeledImage};
pub use split::split_train_test;
pub use trainer::{accuracy, Trainer, TrainingReport};
