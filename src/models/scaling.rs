//! Portion scaling

use serde::Serialize;

use super::nutrient::{NutrientEntry, NutrientFacts};

pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Caller instruction for converting reference nutrients into a portion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingDirective {
    /// Absolute weight, takes precedence when the entry has per-100 g data
    pub grams: Option<f64>,
    pub multiplier: f64,
}

impl Default for ScalingDirective {
    fn default() -> Self {
        Self {
            grams: None,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl ScalingDirective {
    /// Non-positive or non-finite values are dropped (grams) or reset (multiplier)
    pub fn new(grams: Option<f64>, multiplier: Option<f64>) -> Self {
        Self {
            grams: grams.filter(|g| is_positive(*g)),
            multiplier: multiplier.filter(|m| is_positive(*m)).unwrap_or(DEFAULT_MULTIPLIER),
        }
    }

    /// Parse raw form fields; anything unparseable reverts to the default
    pub fn from_fields(grams: Option<&str>, multiplier: Option<&str>) -> Self {
        Self::new(
            grams.and_then(parse_number),
            multiplier.and_then(parse_number),
        )
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Which reference quantity was scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    #[serde(rename = "per_100g")]
    Per100g,
    PerServing,
}

/// Concrete nutrient totals for a portion
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledNutrients {
    pub basis: Basis,
    pub factor: f64,
    pub kcal: i64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub fiber_g: f64,
}

/// Scale an entry by a directive.
///
/// Grams are used only when the entry has a known `per_100g.kcal`; otherwise
/// the serving values are multiplied. Unknown values count as zero.
pub fn scale(entry: &NutrientEntry, directive: &ScalingDirective) -> ScaledNutrients {
    let grams_basis = directive
        .grams
        .filter(|g| is_positive(*g))
        .and_then(|g| entry.per_100g_with_kcal().map(|facts| (facts, g / 100.0)));

    let (basis, facts, factor) = match grams_basis {
        Some((facts, factor)) => (Basis::Per100g, facts, factor),
        None => {
            let multiplier = if is_positive(directive.multiplier) {
                directive.multiplier
            } else {
                DEFAULT_MULTIPLIER
            };
            (Basis::PerServing, entry.serving_basis(), multiplier)
        }
    };

    apply(basis, facts, factor)
}

fn apply(basis: Basis, facts: &NutrientFacts, factor: f64) -> ScaledNutrients {
    let value = |v: Option<f64>| v.unwrap_or(0.0) * factor;

    ScaledNutrients {
        basis,
        factor,
        kcal: value(facts.kcal).round() as i64,
        protein_g: round2(value(facts.protein_g)),
        fat_g: round2(value(facts.fat_g)),
        carbs_g: round2(value(facts.carbs_g)),
        fiber_g: round2(value(facts.fiber_g)),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
