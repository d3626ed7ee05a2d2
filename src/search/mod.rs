//! Search orchestration: turns user triggers into rendered results.
//!
//! Photo searches run preprocess → classify → filter to find a subject; typed
//! searches use the text directly. Either way the subject is looked up and the
//! outcome written to the single output region through a [`Renderer`].

mod debounce;
mod orchestrator;
mod render;

pub use debounce::Debouncer;
pub use orchestrator::{RunOutcome, SearchInput, SearchOrchestrator, Trigger};
pub use render::{ChannelRenderer, RenderState, Renderer, RequestId, SearchUpdate};
