//! Configuration module

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::classifier::InputSpec;

/// Pixel value range the model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputScale {
    /// Raw 0-255 values cast to f32
    Raw,
    /// Values divided by 255
    #[default]
    Unit,
}

impl InputScale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0_255" | "0-255" | "raw" => Some(Self::Raw),
            "0_1" | "0-1" | "unit" => Some(Self::Unit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "0_255",
            Self::Unit => "0_1",
        }
    }
}

impl fmt::Display for InputScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input tensor layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// [1, H, W, 3] (TensorFlow / Keras exports)
    #[default]
    Nhwc,
    /// [1, 3, H, W] (PyTorch exports)
    Nchw,
}

impl TensorLayout {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nhwc" => Some(Self::Nhwc),
            "nchw" => Some(Self::Nchw),
            _ => None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; read before the subscriber exists, so no warnings here
    pub fn from_env() -> Self {
        Self::parse(env::var("LOG_FORMAT").ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Label list, one per line
    pub labels_path: PathBuf,

    /// Label -> nutrient facts JSON
    pub nutrients_path: PathBuf,

    /// Where the empty nutrient template is written when nutrients are missing
    pub nutrients_template_path: PathBuf,

    /// ONNX model artifact
    pub model_path: PathBuf,

    /// Pixel range fed to the model
    pub input_scale: InputScale,

    /// Input tensor layout
    pub input_layout: TensorLayout,

    /// Square side length the image is resized to
    pub image_size: u32,

    /// Upload body limit in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            labels_path: PathBuf::from("model/labels.txt"),
            nutrients_path: PathBuf::from("model/nutrients.json"),
            nutrients_template_path: PathBuf::from("model/nutrients.template.json"),
            model_path: PathBuf::from("model/food_classifier.onnx"),
            input_scale: InputScale::default(),
            input_layout: TensorLayout::default(),
            image_size: 224,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let input_scale = match lookup("INPUT_SCALE") {
            Some(raw) => InputScale::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Unknown INPUT_SCALE '{}', using {}", raw, defaults.input_scale);
                defaults.input_scale
            }),
            None => defaults.input_scale,
        };

        let input_layout = match lookup("INPUT_LAYOUT") {
            Some(raw) => TensorLayout::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Unknown INPUT_LAYOUT '{}', using {:?}", raw, defaults.input_layout);
                defaults.input_layout
            }),
            None => defaults.input_layout,
        };

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            labels_path: lookup("LABELS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.labels_path),

            nutrients_path: lookup("NUTRIENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.nutrients_path),

            nutrients_template_path: lookup("NUTRIENTS_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.nutrients_template_path),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            input_scale,
            input_layout,

            image_size: lookup("IMAGE_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|s: &u32| *s > 0)
                .unwrap_or(defaults.image_size),

            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    /// Preprocessing parameters for the classifier
    pub fn input_spec(&self) -> InputSpec {
        InputSpec {
            size: self.image_size,
            scale: self.input_scale,
            layout: self.input_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, 8000);
        assert_eq!(config.input_scale, InputScale::Unit);
        assert_eq!(config.input_layout, TensorLayout::Nhwc);
        assert_eq!(config.image_size, 224);
        assert_eq!(config.labels_path, PathBuf::from("model/labels.txt"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("INPUT_SCALE", "0_255"),
            ("INPUT_LAYOUT", "NCHW"),
            ("IMAGE_SIZE", "160"),
            ("MODEL_PATH", "/srv/model.onnx"),
        ]));
        assert_eq!(config.port, 9090);
        assert_eq!(config.input_scale, InputScale::Raw);
        assert_eq!(config.input_layout, TensorLayout::Nchw);
        assert_eq!(config.image_size, 160);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.onnx"));
    }

    #[test]
    fn test_garbage_falls_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("INPUT_SCALE", "0_42"),
            ("IMAGE_SIZE", "0"),
        ]));
        assert_eq!(config.port, 8000);
        assert_eq!(config.input_scale, InputScale::Unit);
        assert_eq!(config.image_size, 224);
    }

    #[test]
    fn test_log_format() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }
}
