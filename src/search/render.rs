use std::sync::mpsc;

use crate::encyclopedia::SummaryResult;

/// Sequence number of one triggered search. Later searches get larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// The three mutually exclusive contents of the output region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    /// Transient progress, shown with a spinner.
    Status(String),
    /// Terminal failure of the run.
    Error(String),
    /// Summary card.
    Result(SummaryResult),
}

impl RenderState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RenderState::Status(_))
    }
}

/// Sink for output-region updates.
pub trait Renderer: Send + Sync {
    fn render(&self, id: RequestId, state: RenderState);
}

/// Update message delivered to the UI thread.
#[derive(Debug, Clone)]
pub struct SearchUpdate {
    pub id: RequestId,
    pub state: RenderState,
}

/// Forwards renders to the UI loop, which drains the receiver each tick.
pub struct ChannelRenderer {
    tx: mpsc::Sender<SearchUpdate>,
}

impl ChannelRenderer {
    pub fn new() -> (Self, mpsc::Receiver<SearchUpdate>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Renderer for ChannelRenderer {
    fn render(&self, id: RequestId, state: RenderState) {
        // The receiver only disappears while the app is shutting down.
        let _ = self.tx.send(SearchUpdate { id, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_renderer_preserves_order() {
        let (renderer, rx) = ChannelRenderer::new();
        renderer.render(RequestId(1), RenderState::Status("Searching...".into()));
        renderer.render(RequestId(1), RenderState::Error("boom".into()));

        let updates: Vec<SearchUpdate> = rx.try_iter().collect();
        assert_eq!(updates.len(), 2);
        assert!(!updates[0].state.is_terminal());
        assert!(updates[1].state.is_terminal());
    }
}
