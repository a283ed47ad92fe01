//! Prediction response payloads

use serde::Serialize;

use super::scaling::{Basis, ScaledNutrients, ScalingDirective};

pub const NO_NUTRIENTS_DETAIL: &str = "Nutrients not available for this label";

/// Scaling that produced the reported totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServingOrScale {
    pub grams: Option<f64>,
    pub multiplier: f64,
    pub basis: Basis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_g: Option<f64>,
}

/// Classified label with scaled nutrient totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: String,
    /// Model score in [0, 1], rounded to 4 decimals
    pub confidence: f64,
    pub serving_or_scale: ServingOrScale,
    pub kcal: i64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub fiber_g: f64,
}

impl PredictionResult {
    pub fn new(
        label: String,
        confidence: f64,
        directive: &ScalingDirective,
        serving_g: Option<f64>,
        scaled: ScaledNutrients,
    ) -> Self {
        Self {
            label,
            confidence,
            serving_or_scale: ServingOrScale {
                grams: directive.grams,
                multiplier: directive.multiplier,
                basis: scaled.basis,
                serving_g,
            },
            kcal: scaled.kcal,
            protein_g: scaled.protein_g,
            fat_g: scaled.fat_g,
            carbs_g: scaled.carbs_g,
            fiber_g: scaled.fiber_g,
        }
    }
}

/// Classified label without nutrient data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedNutrients {
    pub label: String,
    pub confidence: f64,
    pub detail: String,
}

/// Outcome of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Nutrients(PredictionResult),
    NoNutrients(UnresolvedNutrients),
}

impl PredictionOutcome {
    pub fn label(&self) -> &str {
        match self {
            Self::Nutrients(result) => &result.label,
            Self::NoNutrients(result) => &result.label,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Nutrients(result) => result.confidence,
            Self::NoNutrients(result) => result.confidence,
        }
    }
}
