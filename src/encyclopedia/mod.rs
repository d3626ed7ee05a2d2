//! Encyclopedia summaries for an identified subject.

mod wikipedia;

pub use wikipedia::{HttpResponse, Transport, UreqTransport, WikipediaClient};

/// Placeholder when a page has neither an extract nor a description.
pub const NOT_AVAILABLE: &str = "description not available";
/// Description used when every endpoint failed.
pub const NOT_FOUND: &str = "information not found";

/// Normalized summary of one encyclopedia page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl SummaryResult {
    /// Degraded result used when no endpoint answered.
    pub fn not_found(subject: &str) -> Self {
        Self {
            title: subject.to_string(),
            description: NOT_FOUND.to_string(),
            image_url: None,
        }
    }
}

/// Port for summary lookups. Never fails: every network or parse problem is
/// absorbed into a valid, possibly degraded, [`SummaryResult`].
pub trait Encyclopedia: Send + Sync {
    fn lookup(&self, subject: &str) -> SummaryResult;
}
