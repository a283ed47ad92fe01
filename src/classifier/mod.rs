//! Classifier Module - image classification adapter
//!
//! The model is consumed as a black box behind the [`Classifier`] trait:
//! an image goes in, a class index and confidence come out.

pub mod onnx;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::config::{InputScale, TensorLayout};

pub use onnx::OnnxClassifier;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Raw model answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub index: usize,
    /// 0.0 - 1.0
    pub confidence: f32,
}

/// Preprocessing parameters for a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSpec {
    pub size: u32,
    pub scale: InputScale,
    pub layout: TensorLayout,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    #[error("model runtime error: {0}")]
    Runtime(String),

    #[error("model produced no scores")]
    EmptyOutput,
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Capability seam for image classifiers (ONNX, test stubs, ...)
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifierError>;

    /// Short human-readable description for status pages and logs
    fn describe(&self) -> String;
}

// ============================================================================
// PREPROCESSING
// ============================================================================

/// Decode uploaded bytes into an image
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Resize, convert to RGB, rescale and lay out as a 4-D f32 tensor
pub fn preprocess(image: &DynamicImage, spec: &InputSpec) -> Array4<f32> {
    let side = spec.size;
    let rgb = image.resize_exact(side, side, FilterType::Triangle).to_rgb8();
    let divisor = match spec.scale {
        InputScale::Raw => 1.0,
        InputScale::Unit => 255.0,
    };
    let side = side as usize;

    match spec.layout {
        TensorLayout::Nhwc => Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / divisor
        }),
        TensorLayout::Nchw => Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / divisor
        }),
    }
}

// ============================================================================
// OUTPUT INTERPRETATION
// ============================================================================

/// Turn model scores into a classification.
///
/// A single value is read as the confidence of class 0; a vector yields its
/// argmax. NaN scores are skipped and the confidence is clamped to [0, 1].
pub fn interpret_output(scores: &[f32]) -> Result<Classification, ClassifierError> {
    match scores {
        [] => Err(ClassifierError::EmptyOutput),
        [single] => Ok(Classification {
            index: 0,
            confidence: clamp_confidence(*single),
        }),
        _ => scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, score)| !score.is_nan())
            .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((i, score)),
            })
            .map(|(index, score)| Classification {
                index,
                confidence: clamp_confidence(score),
            })
            .ok_or(ClassifierError::EmptyOutput),
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
