use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::render::{RenderState, Renderer, RequestId};
use crate::classifier::Classifier;
use crate::encyclopedia::Encyclopedia;
use crate::error::IdentifyError;
use crate::filter::{subject_from_label, ResultFilter};
use crate::preprocess::{Preprocessor, UploadedImage};

/// What caused a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Submit,
    /// Debounced change of the name field.
    TextChanged,
    FileSelected,
}

/// Snapshot of the user's inputs when the search was triggered.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    pub image: Option<PathBuf>,
    pub text: String,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The final state reached the output region.
    Rendered(RenderState),
    /// A newer search started meanwhile; this run's output was discarded.
    Superseded(RenderState),
    /// An image identification was already in flight; nothing ran.
    Dropped,
}

/// Held while an image is being identified; clears the busy flag on drop so
/// every exit path (success, empty filter, error) returns to idle.
struct IdentifyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> IdentifyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for IdentifyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Single entry point for every user-triggered search.
///
/// Steps of one run are strictly sequential: validate, read, prepare,
/// classify, filter, lookup, render. Runs may overlap (each caller runs on its
/// own thread); the latest issued [`RequestId`] owns the output region and
/// renders from older runs are dropped.
pub struct SearchOrchestrator {
    preprocessor: Preprocessor,
    classifier: Arc<dyn Classifier>,
    filter: ResultFilter,
    encyclopedia: Arc<dyn Encyclopedia>,
    renderer: Arc<dyn Renderer>,
    latest: Mutex<u64>,
    identifying: AtomicBool,
}

impl SearchOrchestrator {
    pub fn new(
        preprocessor: Preprocessor,
        classifier: Arc<dyn Classifier>,
        filter: ResultFilter,
        encyclopedia: Arc<dyn Encyclopedia>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            filter,
            encyclopedia,
            renderer,
            latest: Mutex::new(0),
            identifying: AtomicBool::new(false),
        }
    }

    /// True while an image identification is in flight.
    pub fn is_identifying(&self) -> bool {
        self.identifying.load(Ordering::SeqCst)
    }

    /// Run one search to completion on the calling thread.
    pub fn run(&self, trigger: Trigger, input: SearchInput) -> RunOutcome {
        let text = input.text.trim().to_string();

        let guard = match input.image {
            Some(_) => match IdentifyGuard::acquire(&self.identifying) {
                Some(guard) => Some(guard),
                None => {
                    tracing::debug!(?trigger, "Identification already running, trigger dropped");
                    return RunOutcome::Dropped;
                }
            },
            None => None,
        };

        let id = self.begin();
        tracing::info!(?trigger, id = id.0, image = ?input.image, text = %text, "Search started");

        // A rejected file goes straight to its error without any progress state.
        let upload = match input.image {
            Some(ref path) => match self.check_upload(path) {
                Ok(upload) => Some((path.as_path(), upload)),
                Err(e) => return self.finish(id, Err(e)),
            },
            None => None,
        };

        // Replaces whatever the previous search left in the output region.
        self.render(id, RenderState::Status("Searching...".to_string()));

        let subject = match upload {
            Some((path, upload)) => {
                let identified = self.identify(id, path, upload);
                drop(guard);
                identified
            }
            None if !text.is_empty() => Ok(text),
            None => Err(IdentifyError::EmptyInput),
        };

        self.finish(id, subject)
    }

    /// Look up the subject, or report the failure, and render the final state.
    fn finish(&self, id: RequestId, subject: Result<String, IdentifyError>) -> RunOutcome {
        let state = match subject {
            Ok(subject) => {
                self.render(id, RenderState::Status(format!("Looking up \"{}\"...", subject)));
                RenderState::Result(self.encyclopedia.lookup(&subject))
            }
            Err(e) => {
                tracing::warn!(id = id.0, error = %e, "Search failed");
                RenderState::Error(e.to_string())
            }
        };

        if self.render(id, state.clone()) {
            RunOutcome::Rendered(state)
        } else {
            RunOutcome::Superseded(state)
        }
    }

    /// Type and size checks from file metadata; nothing is read.
    fn check_upload(&self, path: &Path) -> Result<UploadedImage, IdentifyError> {
        let upload = UploadedImage::probe(path)?;
        self.preprocessor.validate(&upload)?;
        Ok(upload)
    }

    /// Derive a subject from a validated photo.
    fn identify(
        &self,
        id: RequestId,
        path: &Path,
        mut upload: UploadedImage,
    ) -> Result<String, IdentifyError> {
        upload.read_bytes(path)?;
        // The file may have changed since it was probed.
        self.preprocessor.validate(&upload)?;

        self.render(id, RenderState::Status("Analyzing image...".to_string()));
        let prepared = self.preprocessor.prepare(&upload)?;
        drop(upload);

        self.render(id, RenderState::Status("Loading recognition model...".to_string()));
        self.classifier.load()?;

        self.render(id, RenderState::Status("Identifying animal...".to_string()));
        let candidates = self.classifier.classify(&prepared)?;
        tracing::debug!(id = id.0, ?candidates, "Classifier candidates");

        let best = self
            .filter
            .filter(&candidates)
            .ok_or(IdentifyError::NoRecognizedAnimal)?;

        let subject = subject_from_label(&best.label);
        tracing::info!(id = id.0, label = %best.label, probability = best.probability, %subject, "Animal identified");
        Ok(subject)
    }

    /// Issue the next request id; it becomes the only one allowed to render.
    fn begin(&self) -> RequestId {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *latest += 1;
        RequestId(*latest)
    }

    /// Render unless a newer request has been issued. Holding the lock across
    /// the call keeps renders of different runs from interleaving.
    fn render(&self, id: RequestId, state: RenderState) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if *latest != id.0 {
            tracing::debug!(id = id.0, latest = *latest, "Discarding stale render");
            return false;
        }
        self.renderer.render(id, state);
        true
    }
}
