//! ONNX Runtime classifier
//!
//! The session is not assumed safe for concurrent runs, so every call takes
//! the mutex: one inference in flight per loaded model.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::{interpret_output, preprocess, Classification, Classifier, ClassifierError, InputSpec};

pub struct OnnxClassifier {
    session: Mutex<Session>,
    model_path: PathBuf,
    spec: InputSpec,
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path, spec: InputSpec) -> Result<Self, ClassifierError> {
        tracing::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ClassifierError::Runtime(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| ClassifierError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::Runtime(format!("Failed to load model: {}", e)))?;

        tracing::info!("ONNX model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
            spec,
        })
    }

    fn run(&self, image: &DynamicImage) -> Result<Vec<f32>, ClassifierError> {
        let input_array = preprocess(image, &self.spec);
        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ClassifierError::Preprocess(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ClassifierError::Runtime("No output defined".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifierError::Runtime(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ClassifierError::Runtime("No output".to_string()))?;

        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Runtime(format!("Extract error: {}", e)))?;

        // [1, N] and [N] are read the same way
        Ok(scores.to_vec())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifierError> {
        let start_time = Instant::now();
        let scores = self.run(image)?;
        let classification = interpret_output(&scores)?;

        tracing::debug!(
            "ONNX inference: {} scores, top class {} ({:.3}) in {}us",
            scores.len(),
            classification.index,
            classification.confidence,
            start_time.elapsed().as_micros()
        );

        Ok(classification)
    }

    fn describe(&self) -> String {
        format!(
            "ONNX Runtime (CPU) - {} [{}x{}, {}]",
            self.model_path.display(),
            self.spec.size,
            self.spec.size,
            self.spec.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputScale, TensorLayout};

    #[test]
    fn test_load_missing_model() {
        let spec = InputSpec {
            size: 224,
            scale: InputScale::Unit,
            layout: TensorLayout::Nhwc,
        };
        let dir = tempfile::TempDir::new().unwrap();
        let result = OnnxClassifier::load(&dir.path().join("missing.onnx"), spec);

        match result {
            Err(ClassifierError::Runtime(msg)) => assert!(msg.contains("Model not found")),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("missing model must not load"),
        }
    }
}
