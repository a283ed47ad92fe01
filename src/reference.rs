//! Reference data module - label list and nutrient table
//!
//! Loaded once at startup and read-only afterwards. Missing or malformed
//! files degrade to empty state instead of aborting the process.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::models::{NutrientEntry, NutrientFacts};

pub const TEMPLATE_NOTES: &str = "fill with verified values";

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed nutrient file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered labels plus label -> nutrient facts
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    labels: Vec<String>,
    nutrients: HashMap<String, NutrientEntry>,
}

impl ReferenceData {
    /// Build from in-memory data. Duplicate labels keep their first position.
    pub fn new(labels: Vec<String>, nutrients: HashMap<String, NutrientEntry>) -> Self {
        Self {
            labels: dedup_labels(labels),
            nutrients,
        }
    }

    /// Load labels and nutrients from disk.
    ///
    /// When labels exist but the nutrient file does not, an all-null template
    /// is written to `template_path` for manual curation.
    pub fn load(labels_path: &Path, nutrients_path: &Path, template_path: &Path) -> Self {
        let labels = match read_labels(labels_path) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::warn!("Labels unavailable, predictions disabled: {}", e);
                Vec::new()
            }
        };

        let nutrients = if nutrients_path.exists() {
            match read_nutrients(nutrients_path) {
                Ok(nutrients) => nutrients,
                Err(e) => {
                    tracing::warn!("Nutrient table unavailable: {}", e);
                    HashMap::new()
                }
            }
        } else {
            tracing::warn!("Nutrient file not found: {}", nutrients_path.display());
            if !labels.is_empty() {
                bootstrap_template(&labels, template_path);
            }
            HashMap::new()
        };

        let uncurated = nutrients
            .values()
            .filter(|entry| entry.serving_basis().is_empty() && entry.per_100g_with_kcal().is_none())
            .count();
        if uncurated > 0 {
            tracing::warn!("{} nutrient entries have no values yet", uncurated);
        }

        let data = Self::new(labels, nutrients);
        tracing::info!(
            "Reference data loaded: {} labels, {} nutrient entries",
            data.labels_count(),
            data.nutrients_count()
        );
        data
    }

    /// True iff at least one label is known
    pub fn is_ready(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn labels_count(&self) -> usize {
        self.labels.len()
    }

    pub fn nutrients_loaded(&self) -> bool {
        !self.nutrients.is_empty()
    }

    pub fn nutrients_count(&self) -> usize {
        self.nutrients.len()
    }

    pub fn lookup(&self, label: &str) -> Option<&NutrientEntry> {
        self.nutrients.get(label)
    }

    /// Label for a class index; out-of-range indices become `class_<index>`
    pub fn label_for(&self, index: usize) -> Cow<'_, str> {
        match self.labels.get(index) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("class_{}", index)),
        }
    }
}

fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(labels.len());
    labels
        .into_iter()
        .filter(|label| {
            let fresh = seen.insert(label.clone());
            if !fresh {
                tracing::warn!("Duplicate label dropped: {}", label);
            }
            fresh
        })
        .collect()
}

/// One label per line, trimmed, blank lines skipped
pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_labels(path: &Path) -> Result<Vec<String>, ReferenceError> {
    let contents = fs::read_to_string(path).map_err(|source| ReferenceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_labels(&contents))
}

fn read_nutrients(path: &Path) -> Result<HashMap<String, NutrientEntry>, ReferenceError> {
    let contents = fs::read_to_string(path).map_err(|source| ReferenceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let document: Map<String, Value> =
        serde_json::from_str(&contents).map_err(|source| ReferenceError::Json {
            path: path.display().to_string(),
            source,
        })?;
    Ok(parse_nutrient_entries(document))
}

/// Convert entries one by one; null or malformed entries are skipped
pub fn parse_nutrient_entries(document: Map<String, Value>) -> HashMap<String, NutrientEntry> {
    document
        .into_iter()
        .filter_map(|(label, value)| {
            if value.is_null() {
                tracing::debug!("No nutrient data for {}", label);
                return None;
            }
            match serde_json::from_value::<NutrientEntry>(value) {
                Ok(entry) => Some((label, entry)),
                Err(e) => {
                    tracing::warn!("Skipping malformed nutrient entry {}: {}", label, e);
                    None
                }
            }
        })
        .collect()
}

/// All-null nutrient document, one entry per label
pub fn template_document(labels: &[String]) -> Value {
    let blank = serde_json::to_value(NutrientFacts::default()).unwrap_or(Value::Null);
    let entries: Map<String, Value> = labels
        .iter()
        .map(|label| {
            (
                label.clone(),
                json!({
                    "serving_g": null,
                    "per_serving": blank,
                    "per_100g": blank,
                    "notes": TEMPLATE_NOTES,
                }),
            )
        })
        .collect();
    Value::Object(entries)
}

fn bootstrap_template(labels: &[String], template_path: &Path) {
    if template_path.exists() {
        tracing::debug!("Nutrient template already present at {}", template_path.display());
        return;
    }

    let document = template_document(labels);
    let written = serde_json::to_string_pretty(&document)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            if let Some(parent) = template_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            fs::write(template_path, text).map_err(|e| e.to_string())
        });

    match written {
        Ok(()) => tracing::info!(
            "Wrote nutrient template for {} labels to {}",
            labels.len(),
            template_path.display()
        ),
        Err(e) => tracing::warn!("Could not write nutrient template: {}", e),
    }
}
