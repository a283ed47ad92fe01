//! Nutrient reference records
//!
//! Every numeric field is optional: `null` or absent means "unknown".
//! Unknown values stay `None` here and are only coerced to zero when scaled.

use serde::{Deserialize, Serialize};

/// Nutrient values for one reference quantity (a serving or 100 g)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientFacts {
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
}

impl NutrientFacts {
    pub fn is_empty(&self) -> bool {
        self.kcal.is_none()
            && self.protein_g.is_none()
            && self.fat_g.is_none()
            && self.carbs_g.is_none()
            && self.fiber_g.is_none()
    }
}

/// Nutrient facts for one label
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NutrientEntry {
    /// Reference serving size in grams
    #[serde(default)]
    pub serving_g: Option<f64>,

    #[serde(default)]
    pub per_serving: Option<NutrientFacts>,

    #[serde(default)]
    pub per_100g: Option<NutrientFacts>,

    #[serde(default)]
    pub notes: Option<String>,

    /// Older files put the serving values directly on the entry
    #[serde(flatten)]
    pub inline: NutrientFacts,
}

impl NutrientEntry {
    /// Facts used for multiplier scaling: `per_serving`, else the inline fields
    pub fn serving_basis(&self) -> &NutrientFacts {
        self.per_serving.as_ref().unwrap_or(&self.inline)
    }

    /// `per_100g`, only when it carries a known kcal value
    pub fn per_100g_with_kcal(&self) -> Option<&NutrientFacts> {
        self.per_100g.as_ref().filter(|facts| facts.kcal.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_entry() {
        let entry: NutrientEntry = serde_json::from_str(
            r#"{
                "serving_g": 350,
                "per_serving": {"kcal": 650, "protein_g": 30, "fat_g": 15, "carbs_g": 70, "fiber_g": 5},
                "per_100g": {"kcal": 200, "protein_g": null, "fat_g": 4.5, "carbs_g": 21},
                "notes": "restaurant portion"
            }"#,
        )
        .unwrap();

        assert_eq!(entry.serving_g, Some(350.0));
        assert_eq!(entry.per_serving.as_ref().unwrap().kcal, Some(650.0));
        let per_100g = entry.per_100g.as_ref().unwrap();
        assert_eq!(per_100g.protein_g, None);
        assert_eq!(per_100g.fiber_g, None);
        assert_eq!(entry.notes.as_deref(), Some("restaurant portion"));
        assert!(entry.inline.is_empty());
    }

    #[test]
    fn test_inline_fields_used_without_per_serving() {
        let entry: NutrientEntry =
            serde_json::from_str(r#"{"kcal": 120, "protein_g": 2.5}"#).unwrap();

        assert!(entry.per_serving.is_none());
        assert_eq!(entry.serving_basis().kcal, Some(120.0));
        assert_eq!(entry.serving_basis().protein_g, Some(2.5));
    }

    #[test]
    fn test_per_100g_without_kcal_is_ignored() {
        let entry: NutrientEntry =
            serde_json::from_str(r#"{"per_100g": {"kcal": null, "protein_g": 3}}"#).unwrap();
        assert!(entry.per_100g_with_kcal().is_none());
    }

    #[test]
    fn test_template_shaped_entry_parses() {
        let entry: NutrientEntry = serde_json::from_str(
            r#"{"serving_g": null, "per_serving": {"kcal": null}, "per_100g": null, "notes": null}"#,
        )
        .unwrap();
        assert!(entry.serving_basis().is_empty());
    }
}
