pub mod pipeline;
pub mod types;

pub use pipeline::DiagnosisPipeline;
pub use types::Diagnosis;
