use crate::{
    advisor::{canonicalize_label, recommend},
    diagnosis::Diagnosis,
    image::ImageLoader,
    models::{PestClassifier, Prediction},
    Result,
};
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;

/// 识别流水线：解码 -> 特征 -> 预测 -> 查表
///
/// 启动时构建一次，之后只读共享。
#[derive(Debug, Clone)]
pub struct DiagnosisPipeline {
    classifier: PestClassifier,
}

impl DiagnosisPipeline {
    pub fn new(classifier: PestClassifier) -> Self {
        Self { classifier }
    }

    pub fn load(model_path: &Path) -> Result<Self> {
        Ok(Self::new(PestClassifier::load(model_path)?))
    }

    pub fn classifier(&self) -> &PestClassifier {
        &self.classifier
    }

    pub fn diagnose_bytes(&self, bytes: &[u8]) -> Result<Diagnosis> {
        let start_time = Instant::now();
        let image = ImageLoader::from_bytes(bytes)?;
        self.diagnose_image(&image, start_time)
    }

    pub fn diagnose_path(&self, path: &Path) -> Result<Diagnosis> {
        let start_time = Instant::now();
        let image = ImageLoader::from_path(path)?;
        self.diagnose_image(&image, start_time)
    }

    fn diagnose_image(&self, image: &DynamicImage, start_time: Instant) -> Result<Diagnosis> {
        let prediction = self.classifier.predict_image(image)?;
        let diagnosis = Self::build_diagnosis(&prediction, start_time);

        tracing::info!(
            "Detected pest: {} (class {}, confidence {:.3}, {}ms)",
            diagnosis.pest,
            prediction.index,
            diagnosis.confidence,
            diagnosis.processing_time_ms
        );
        tracing::debug!(
            "Remedies: {:?}; organic: {}; soil effect: {}",
            diagnosis.remedies,
            diagnosis.organic,
            diagnosis.soil_effect
        );

        Ok(diagnosis)
    }

    fn build_diagnosis(prediction: &Prediction, start_time: Instant) -> Diagnosis {
        let pest = canonicalize_label(&prediction.label);
        let recommendation = recommend(&pest);

        Diagnosis {
            recognized: recommendation.pest().is_some(),
            pesticide: recommendation.pesticide_summary(),
            remedies: recommendation.remedies(),
            organic: recommendation.organic().to_string(),
            soil_effect: recommendation.soil_effect().to_string(),
            confidence: prediction.confidence,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            image_url: None,
            pest,
        }
    }
}
