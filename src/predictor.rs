//! Prediction pipeline
//!
//! validate -> classify -> resolve label -> scale nutrients. Stops at the
//! first failure; rendering is left to the HTTP layer.

use std::sync::Arc;
use std::time::Instant;

use crate::classifier::{decode_image, Classification, Classifier};
use crate::models::{
    scale, PredictionOutcome, PredictionResult, ScalingDirective, UnresolvedNutrients,
    NO_NUTRIENTS_DETAIL,
};
use crate::reference::ReferenceData;
use crate::{AppError, AppResult};

#[derive(Clone)]
pub struct Predictor {
    reference: Arc<ReferenceData>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Predictor {
    pub fn new(reference: Arc<ReferenceData>, classifier: Option<Arc<dyn Classifier>>) -> Self {
        Self {
            reference,
            classifier,
        }
    }

    /// Labels and model must both be present
    pub fn ensure_ready(&self) -> AppResult<&dyn Classifier> {
        if !self.reference.is_ready() {
            return Err(AppError::NotConfigured("Labels not loaded".to_string()));
        }
        self.classifier
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("Model file not found".to_string()))
    }

    /// Run the full pipeline on an uploaded payload
    pub fn predict(
        &self,
        payload: Option<&[u8]>,
        directive: ScalingDirective,
    ) -> AppResult<PredictionOutcome> {
        let classifier = self.ensure_ready()?;
        let payload = payload
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;

        let image = decode_image(payload).map_err(|e| {
            tracing::debug!("Rejected upload: {}", e);
            AppError::InvalidInput("Invalid image".to_string())
        })?;

        let start_time = Instant::now();
        let classification = classifier.classify(&image)?;
        let elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        let outcome = self.resolve(classification, directive);
        tracing::info!(
            "Predicted {} ({:.4}) in {:.1}ms",
            outcome.label(),
            outcome.confidence(),
            elapsed_ms
        );
        Ok(outcome)
    }

    /// Map a classification onto a label and its scaled nutrients
    pub fn resolve(
        &self,
        classification: Classification,
        directive: ScalingDirective,
    ) -> PredictionOutcome {
        let label = self.reference.label_for(classification.index).into_owned();
        let confidence = round4(f64::from(classification.confidence));

        match self.reference.lookup(&label) {
            Some(entry) => {
                let scaled = scale(entry, &directive);
                PredictionOutcome::Nutrients(PredictionResult::new(
                    label,
                    confidence,
                    &directive,
                    entry.serving_g,
                    scaled,
                ))
            }
            None => PredictionOutcome::NoNutrients(UnresolvedNutrients {
                label,
                confidence,
                detail: NO_NUTRIENTS_DETAIL.to_string(),
            }),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use crate::models::{NutrientEntry, NutrientFacts};
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::collections::HashMap;
    use std::io::Cursor;

    /// Deterministic classifier returning a fixed answer
    pub struct StubClassifier(pub Result<Classification, &'static str>);

    impl StubClassifier {
        pub fn returning(index: usize, confidence: f32) -> Self {
            Self(Ok(Classification { index, confidence }))
        }
    }

    impl Classifier for StubClassifier {
        fn classify(&self, _image: &DynamicImage) -> Result<Classification, ClassifierError> {
            self.0.map_err(|msg| ClassifierError::Runtime(msg.to_string()))
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    pub fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([200, 120, 40])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    pub fn sample_reference() -> ReferenceData {
        let mut nutrients = HashMap::new();
        nutrients.insert(
            "rice_chicken".to_string(),
            NutrientEntry {
                serving_g: Some(325.0),
                per_serving: Some(NutrientFacts {
                    kcal: Some(650.0),
                    protein_g: Some(30.0),
                    fat_g: Some(15.0),
                    carbs_g: Some(70.0),
                    fiber_g: Some(5.0),
                }),
                per_100g: Some(NutrientFacts {
                    kcal: Some(200.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        ReferenceData::new(
            vec!["salad".to_string(), "rice_chicken".to_string()],
            nutrients,
        )
    }

    fn predictor_with(classifier: StubClassifier) -> Predictor {
        Predictor::new(Arc::new(sample_reference()), Some(Arc::new(classifier)))
    }

    #[test]
    fn test_rice_chicken_default_serving() {
        let predictor = predictor_with(StubClassifier::returning(1, 0.91));
        let outcome = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap();

        let PredictionOutcome::Nutrients(result) = outcome else {
            panic!("expected nutrients");
        };
        assert_eq!(result.label, "rice_chicken");
        assert_eq!(result.confidence, 0.91);
        assert_eq!(result.kcal, 650);
        assert_eq!(result.protein_g, 30.0);
        assert_eq!(result.fat_g, 15.0);
        assert_eq!(result.carbs_g, 70.0);
        assert_eq!(result.fiber_g, 5.0);
        assert_eq!(result.serving_or_scale.serving_g, Some(325.0));
    }

    #[test]
    fn test_rice_chicken_by_grams() {
        let predictor = predictor_with(StubClassifier::returning(1, 0.91));
        let outcome = predictor
            .predict(Some(&png_bytes()), ScalingDirective::new(Some(50.0), None))
            .unwrap();

        let PredictionOutcome::Nutrients(result) = outcome else {
            panic!("expected nutrients");
        };
        assert_eq!(result.kcal, 100);
        assert_eq!(result.protein_g, 0.0);
    }

    #[test]
    fn test_label_without_entry_is_not_an_error() {
        let predictor = predictor_with(StubClassifier::returning(0, 0.6));
        let outcome = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap();

        assert_eq!(
            outcome,
            PredictionOutcome::NoNutrients(UnresolvedNutrients {
                label: "salad".to_string(),
                confidence: 0.6,
                detail: NO_NUTRIENTS_DETAIL.to_string(),
            })
        );
    }

    #[test]
    fn test_out_of_range_index_synthesizes_label() {
        let predictor = predictor_with(StubClassifier::returning(7, 0.5));
        let outcome = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap();
        assert_eq!(outcome.label(), "class_7");
        assert!(matches!(outcome, PredictionOutcome::NoNutrients(_)));
    }

    #[test]
    fn test_empty_labels_not_configured() {
        let predictor = Predictor::new(
            Arc::new(ReferenceData::default()),
            Some(Arc::new(StubClassifier::returning(0, 1.0))),
        );
        let err = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));

        let err = predictor.predict(None, ScalingDirective::default()).unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }

    #[test]
    fn test_missing_model_not_configured() {
        let predictor = Predictor::new(Arc::new(sample_reference()), None);
        let err = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }

    #[test]
    fn test_missing_and_corrupt_payload() {
        let predictor = predictor_with(StubClassifier::returning(1, 0.9));

        let err = predictor.predict(None, ScalingDirective::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = predictor
            .predict(Some(b"GIF89a-but-not-really"), ScalingDirective::default())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_classifier_failure_is_inference_failure() {
        let predictor = predictor_with(StubClassifier(Err("session poisoned")));
        let err = predictor
            .predict(Some(&png_bytes()), ScalingDirective::default())
            .unwrap_err();
        match err {
            AppError::InferenceFailure(msg) => assert!(msg.contains("session poisoned")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
