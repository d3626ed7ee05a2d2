//! MobileNet classifier using ONNX Runtime

use anyhow::{anyhow, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use super::{Candidate, Classifier};
use crate::config::ClassifierConfig;
use crate::error::IdentifyError;
use crate::preprocess::PreparedImage;

/// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

const INPUT_NAME: &str = "input";

struct LoadedModel {
    session: Mutex<Session>,
    labels: Vec<String>,
}

/// MobileNet ImageNet classifier.
///
/// The session lives inside the instance rather than in a static, so tests and
/// callers can hold as many (or as few) classifiers as they like. Loading is
/// guarded by a `OnceLock`: concurrent first callers block on one download,
/// and a failed load is remembered for the lifetime of the instance.
pub struct OnnxClassifier {
    config: ClassifierConfig,
    model: OnceLock<Option<LoadedModel>>,
}

impl OnnxClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            model: OnceLock::new(),
        }
    }

    /// Check if the model has been loaded successfully
    pub fn is_ready(&self) -> bool {
        matches!(self.model.get(), Some(Some(_)))
    }

    fn model(&self) -> Option<&LoadedModel> {
        self.model
            .get_or_init(|| match load_model(&self.config) {
                Ok(model) => {
                    tracing::info!(
                        version = self.config.version,
                        alpha = self.config.alpha,
                        labels = model.labels.len(),
                        "Classifier model loaded"
                    );
                    Some(model)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load classifier model");
                    None
                }
            })
            .as_ref()
    }
}

impl Classifier for OnnxClassifier {
    fn load(&self) -> Result<(), IdentifyError> {
        self.model()
            .map(|_| ())
            .ok_or(IdentifyError::ModelUnavailable)
    }

    fn classify(&self, image: &PreparedImage) -> Result<Vec<Candidate>, IdentifyError> {
        let model = self.model().ok_or(IdentifyError::ModelUnavailable)?;

        let logits = run_session(model, image).map_err(|e| {
            tracing::error!(error = %e, "Classifier inference failed");
            IdentifyError::ModelUnavailable
        })?;

        Ok(rank(&logits, &model.labels, self.config.top_k))
    }
}

fn model_filename(config: &ClassifierConfig) -> String {
    format!("mobilenet-v{}-{:.2}.onnx", config.version, config.alpha)
}

/// Download a model asset if it doesn't exist
fn ensure_asset(dir: &Path, filename: &str, url: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!(asset = %filename, "Downloading classifier asset...");
        let response = ureq::get(url)
            .call()
            .map_err(|e| anyhow!("Failed to download {}: {}", filename, e))?;

        // Write beside the target first so an interrupted download is not mistaken for a model.
        let partial = dir.join(format!("{}.part", filename));
        let mut file = std::fs::File::create(&partial)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        std::fs::rename(&partial, &path)?;
        tracing::info!(asset = %filename, path = ?path, "Classifier asset downloaded");
    }

    Ok(path)
}

fn load_labels(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let labels: Vec<String> = content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if labels.is_empty() {
        return Err(anyhow!("Labels file {:?} is empty", path));
    }

    Ok(labels)
}

fn load_model(config: &ClassifierConfig) -> Result<LoadedModel> {
    let labels_path = ensure_asset(&config.models_dir, "imagenet-labels.txt", &config.labels_url)?;
    let labels = load_labels(&labels_path)?;

    let model_path = ensure_asset(&config.models_dir, &model_filename(config), &config.model_url)?;

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(&model_path)?;

    Ok(LoadedModel {
        session: Mutex::new(session),
        labels,
    })
}

fn run_session(model: &LoadedModel, image: &PreparedImage) -> Result<Vec<f32>> {
    let size = image.size() as usize;
    let input_data = to_nchw(image);

    let input_tensor = Tensor::from_array(([1usize, 3, size, size], input_data.into_boxed_slice()))?;

    let mut session = model
        .session
        .lock()
        .map_err(|e| anyhow!("Failed to lock model: {}", e))?;

    let outputs = session.run(ort::inputs![INPUT_NAME => input_tensor])?;

    let logits_output = outputs
        .iter()
        .next()
        .ok_or_else(|| anyhow!("No classifier output"))?;

    let (_shape, logits) = logits_output.1.try_extract_tensor::<f32>()?;

    Ok(logits.to_vec())
}

/// Convert the canvas to a normalized NCHW f32 buffer.
fn to_nchw(image: &PreparedImage) -> Vec<f32> {
    let size = image.size() as usize;
    let plane = size * size;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in image.pixels.enumerate_pixels() {
        let idx = y as usize * size + x as usize;
        for c in 0..3 {
            data[c * plane + idx] = ((pixel[c] as f32 / 255.0) - MEAN[c]) / STD[c];
        }
    }

    data
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exp.iter().sum();

    if sum > 0.0 {
        exp.iter().map(|&x| x / sum).collect()
    } else {
        exp
    }
}

fn is_distribution(values: &[f32]) -> bool {
    let sum: f32 = values.iter().sum();
    values.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() < 1e-3
}

/// Turn raw model output into the top `k` labelled candidates.
fn rank(output: &[f32], labels: &[String], k: usize) -> Vec<Candidate> {
    // TF-style exports prepend a "background" class.
    let scores = if output.len() == labels.len() + 1 {
        &output[1..]
    } else {
        output
    };

    let probabilities = if is_distribution(scores) {
        scores.to_vec()
    } else {
        softmax(scores)
    };

    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .filter_map(|(i, p)| labels.get(i).map(|label| Candidate::new(label.clone(), p)))
        .take(k)
        .collect()
}
