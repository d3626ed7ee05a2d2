//! Image classification behind an injectable port.
//!
//! The orchestrator only sees [`Classifier`]; the production implementation
//! runs a MobileNet ImageNet model through ONNX Runtime.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::error::IdentifyError;
use crate::preprocess::PreparedImage;

/// One ranked label emitted by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    /// Probability in `[0, 1]`.
    pub probability: f32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Port for anything that can rank labels for a prepared image.
pub trait Classifier: Send + Sync {
    /// Make the model ready. Idempotent: the expensive work happens at most
    /// once, and a failed first attempt keeps reporting `ModelUnavailable`.
    fn load(&self) -> Result<(), IdentifyError>;

    /// Candidates in descending probability, exactly as the model ranks them.
    fn classify(&self, image: &PreparedImage) -> Result<Vec<Candidate>, IdentifyError>;
}
