pub mod artifact;
pub mod calibration;
pub mod classifier;

pub use artifact::{ImageSize, ModelArtifact, TrainingMetrics};
pub use calibration::PlattScaling;
pub use classifier::{BinaryModel, LinearSvm, PestClassifier, Prediction};
