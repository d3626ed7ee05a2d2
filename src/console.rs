//! Headless rendering for one-shot searches from the command line.

use std::io::Write;

use crate::search::{RenderState, Renderer, RequestId};

/// Progress goes to stderr; the final card is printed by the caller.
pub struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render(&self, _id: RequestId, state: RenderState) {
        if let RenderState::Status(message) = state {
            let _ = writeln!(std::io::stderr(), "... {}", message);
        }
    }
}

/// Plain-text form of a render state.
pub fn format_state(state: &RenderState) -> String {
    match state {
        RenderState::Status(message) => format!("... {}", message),
        RenderState::Error(message) => format!("Error: {}", message),
        RenderState::Result(summary) => {
            let underline = "=".repeat(summary.title.chars().count());
            let mut out = format!("{}\n{}\n\n{}", summary.title, underline, summary.description);
            if let Some(ref url) = summary.image_url {
                out.push_str(&format!("\n\nImage: {}", url));
            }
            out
        }
    }
}
