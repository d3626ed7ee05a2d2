use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{Encyclopedia, SummaryResult, NOT_AVAILABLE};
use crate::config::EncyclopediaConfig;

/// Status and body of a finished HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal GET transport, split out so lookups can be exercised offline.
pub trait Transport: Send + Sync {
    /// `Err` only for transport failures; HTTP error statuses are returned as responses.
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("animalid/", env!("CARGO_PKG_VERSION")))
            .build();

        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        match self.agent.get(url).set("Accept", "application/json").call() {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| anyhow!("Failed to read response body: {}", e))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(anyhow!("Request failed: {}", e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    title: Option<String>,
    extract: Option<String>,
    description: Option<String>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl PageSummary {
    fn normalize(self, subject: &str) -> SummaryResult {
        SummaryResult {
            title: non_empty(self.title).unwrap_or_else(|| subject.to_string()),
            description: non_empty(self.extract)
                .or_else(|| non_empty(self.description))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            image_url: non_empty(self.thumbnail.and_then(|t| t.source)),
        }
    }
}

/// REST summary endpoint for one language edition.
pub fn summary_url(language: &str, subject: &str) -> Result<String> {
    let mut url = Url::parse(&format!(
        "https://{}.wikipedia.org/api/rest_v1/page/summary/",
        language
    ))?;

    // Page titles use underscores; everything else is percent-encoded by `push`.
    url.path_segments_mut()
        .map_err(|_| anyhow!("Cannot build summary URL for {}", language))?
        .pop_if_empty()
        .push(&subject.replace(' ', "_"));

    Ok(url.into())
}

/// Wikipedia summaries with a primary→secondary language fallback.
pub struct WikipediaClient<T: Transport = UreqTransport> {
    transport: T,
    primary: String,
    secondary: String,
}

impl WikipediaClient<UreqTransport> {
    pub fn from_config(config: &EncyclopediaConfig) -> Self {
        let transport = UreqTransport::new(Duration::from_secs(config.timeout_secs));
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> WikipediaClient<T> {
    pub fn with_transport(transport: T, config: &EncyclopediaConfig) -> Self {
        Self {
            transport,
            primary: config.primary_language.clone(),
            secondary: config.secondary_language.clone(),
        }
    }

    /// One endpoint; `None` on anything but a parseable 2xx.
    fn fetch(&self, language: &str, subject: &str) -> Option<SummaryResult> {
        let url = match summary_url(language, subject) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(language, subject, error = %e, "Invalid summary URL");
                return None;
            }
        };

        let response = match self.transport.get(&url) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "Summary request failed");
                return None;
            }
        };

        if !response.is_success() {
            tracing::debug!(%url, status = response.status, "Summary not available");
            return None;
        }

        match serde_json::from_str::<PageSummary>(&response.body) {
            Ok(summary) => Some(summary.normalize(subject)),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Failed to parse summary");
                None
            }
        }
    }
}

impl<T: Transport> Encyclopedia for WikipediaClient<T> {
    fn lookup(&self, subject: &str) -> SummaryResult {
        if let Some(result) = self.fetch(&self.primary, subject) {
            return result;
        }

        if let Some(mut result) = self.fetch(&self.secondary, subject) {
            result.description = format!(
                "[{}] {}",
                self.secondary.to_uppercase(),
                result.description
            );
            return result;
        }

        tracing::info!(subject, "No encyclopedia entry found");
        SummaryResult::not_found(subject)
    }
}
