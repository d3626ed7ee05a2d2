use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest accepted upload (5 MB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
/// Smallest accepted width or height in pixels.
pub const MIN_IMAGE_DIMENSION: u32 = 50;
/// Side of the square classifier input canvas.
pub const CANVAS_SIZE: u32 = 224;
/// Candidates at or below this probability are discarded.
pub const MIN_PROBABILITY: f32 = 0.15;
/// Quiet period before a typed name triggers a search.
pub const DEBOUNCE_MS: u64 = 800;

pub const MODEL_VERSION: u32 = 2;
pub const MODEL_ALPHA: f32 = 1.0;
pub const DEFAULT_TOP_K: usize = 5;

pub const PRIMARY_LANGUAGE: &str = "en";
pub const SECONDARY_LANGUAGE: &str = "fr";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,

    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,
}

fn default_max_bytes() -> u64 {
    MAX_IMAGE_BYTES
}

fn default_min_dimension() -> u32 {
    MIN_IMAGE_DIMENSION
}

fn default_canvas_size() -> u32 {
    CANVAS_SIZE
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            min_dimension: default_min_dimension(),
            canvas_size: default_canvas_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// MobileNet version; only 2 has a published ONNX export we download.
    #[serde(default = "default_model_version")]
    pub version: u32,

    /// MobileNet width multiplier.
    #[serde(default = "default_model_alpha")]
    pub alpha: f32,

    #[serde(default = "default_model_url")]
    pub model_url: String,

    #[serde(default = "default_labels_url")]
    pub labels_url: String,

    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_model_version() -> u32 {
    MODEL_VERSION
}

fn default_model_alpha() -> f32 {
    MODEL_ALPHA
}

fn default_model_url() -> String {
    "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx"
        .to_string()
}

fn default_labels_url() -> String {
    "https://raw.githubusercontent.com/pytorch/hub/master/imagenet_classes.txt".to_string()
}

fn default_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("animalid")
        .join("models")
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            version: default_model_version(),
            alpha: default_model_alpha(),
            model_url: default_model_url(),
            labels_url: default_labels_url(),
            models_dir: default_models_dir(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_min_probability")]
    pub min_probability: f32,

    /// Case-insensitive substrings of labels the model emits for non-animals.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

fn default_min_probability() -> f32 {
    MIN_PROBABILITY
}

fn default_denylist() -> Vec<String> {
    vec!["nematode".to_string(), "background".to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_probability: default_min_probability(),
            denylist: default_denylist(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncyclopediaConfig {
    #[serde(default = "default_primary_language")]
    pub primary_language: String,

    #[serde(default = "default_secondary_language")]
    pub secondary_language: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_primary_language() -> String {
    PRIMARY_LANGUAGE.to_string()
}

fn default_secondary_language() -> String {
    SECONDARY_LANGUAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            primary_language: default_primary_language(),
            secondary_language: default_secondary_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageProtocol {
    #[default]
    Auto,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreviewConfig {
    /// Thumbnail rendering in the result card. `none` disables it.
    #[serde(default)]
    pub protocol: ImageProtocol,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("animalid")
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ANIMALID_CONFIG") {
            return PathBuf::from(path);
        }

        Self::config_dir().join("config.toml")
    }
}
