use std::time::{Duration, Instant};

/// Holds back text changes until the input has been quiet for a while.
///
/// Driven by the caller's clock: `input` on every keystroke, `poll` on every
/// UI tick. Only the text of the last keystroke in a burst is released.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a change and restart the quiet period.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now + self.quiet));
    }

    /// Forget the pending change (an explicit submit already covers it).
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending text once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }
}
