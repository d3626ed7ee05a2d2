//! Result card thumbnail fetched in the background.
//!
//! Only the image of the card currently on screen is held; a new result (or
//! any other output state) evicts it.

use image::DynamicImage;
use ratatui_image::{picker::Picker, protocol::StatefulProtocol};
use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use crate::config::ImageProtocol;

/// Cap on downloaded thumbnail size.
const MAX_THUMBNAIL_BYTES: u64 = 5 * 1024 * 1024;

enum ThumbnailState {
    Loading,
    Ready(StatefulProtocol),
    Failed,
}

struct Thumbnail {
    url: String,
    state: ThumbnailState,
}

pub struct ThumbnailLoader {
    /// `None` when the terminal can't show images or previews are disabled.
    picker: Option<Picker>,
    agent: ureq::Agent,
    current: Option<Thumbnail>,
    receiver: mpsc::Receiver<(String, Option<DynamicImage>)>,
    sender: mpsc::Sender<(String, Option<DynamicImage>)>,
}

impl ThumbnailLoader {
    pub fn new(protocol: ImageProtocol, timeout: Duration) -> Self {
        let picker = match protocol {
            ImageProtocol::None => None,
            ImageProtocol::Auto => Picker::from_query_stdio().ok(),
        };
        Self::with_picker(picker, timeout)
    }

    pub fn disabled() -> Self {
        Self::with_picker(None, Duration::from_secs(1))
    }

    fn with_picker(picker: Option<Picker>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("animalid/", env!("CARGO_PKG_VERSION")))
            .build();
        let (sender, receiver) = mpsc::channel();
        Self {
            picker,
            agent,
            current: None,
            receiver,
            sender,
        }
    }

    pub fn is_available(&self) -> bool {
        self.picker.is_some()
    }

    pub fn is_loading(&self, url: &str) -> bool {
        matches!(
            self.current,
            Some(Thumbnail { url: ref current, state: ThumbnailState::Loading }) if current == url
        )
    }

    /// Drop the held thumbnail unless it belongs to `url`.
    pub fn retain(&mut self, url: Option<&str>) {
        let keep = match (&self.current, url) {
            (Some(current), Some(url)) => current.url == url,
            _ => false,
        };
        if !keep {
            self.current = None;
        }
    }

    /// Apply completed downloads; results for evicted urls are discarded.
    fn poll(&mut self) {
        while let Ok((url, img)) = self.receiver.try_recv() {
            let Some(current) = self.current.as_mut() else {
                continue;
            };
            if current.url != url {
                tracing::debug!(%url, "Discarding thumbnail of a replaced result");
                continue;
            }
            current.state = match (img, self.picker.as_mut()) {
                (Some(img), Some(picker)) => ThumbnailState::Ready(picker.new_resize_protocol(img)),
                _ => ThumbnailState::Failed,
            };
        }
    }

    /// Protocol for a thumbnail, starting its download on first request.
    pub fn get(&mut self, url: &str) -> Option<&mut StatefulProtocol> {
        self.poll();

        let is_current = self.current.as_ref().is_some_and(|t| t.url == url);
        if !is_current && self.picker.is_some() {
            self.current = Some(Thumbnail {
                url: url.to_string(),
                state: ThumbnailState::Loading,
            });
            self.spawn_download(url.to_string());
        }

        match self.current {
            Some(Thumbnail {
                state: ThumbnailState::Ready(ref mut protocol),
                ..
            }) => Some(protocol),
            _ => None,
        }
    }

    fn spawn_download(&self, url: String) {
        let agent = self.agent.clone();
        let sender = self.sender.clone();

        std::thread::spawn(move || {
            let img = match download(&agent, &url) {
                Ok(img) => Some(img),
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Thumbnail download failed");
                    None
                }
            };
            let _ = sender.send((url, img));
        });
    }
}

fn download(agent: &ureq::Agent, url: &str) -> anyhow::Result<DynamicImage> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| anyhow::anyhow!("Request failed: {}", e))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_THUMBNAIL_BYTES)
        .read_to_end(&mut bytes)?;

    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loading(url: &str) -> Option<Thumbnail> {
        Some(Thumbnail {
            url: url.to_string(),
            state: ThumbnailState::Loading,
        })
    }

    #[test]
    fn test_new_result_evicts_previous_thumbnail() {
        let mut loader = ThumbnailLoader::disabled();
        loader.current = loading("https://example.org/cat.jpg");

        loader.retain(Some("https://example.org/cat.jpg"));
        assert!(loader.is_loading("https://example.org/cat.jpg"));

        loader.retain(Some("https://example.org/dog.jpg"));
        assert!(loader.current.is_none());

        loader.current = loading("https://example.org/dog.jpg");
        loader.retain(None);
        assert!(loader.current.is_none());
    }

    #[test]
    fn test_late_download_for_replaced_url_is_ignored() {
        let mut loader = ThumbnailLoader::disabled();
        loader.current = loading("https://example.org/dog.jpg");

        loader
            .sender
            .send(("https://example.org/cat.jpg".to_string(), None))
            .unwrap();
        loader.poll();
        assert!(loader.is_loading("https://example.org/dog.jpg"));

        loader
            .sender
            .send(("https://example.org/dog.jpg".to_string(), None))
            .unwrap();
        loader.poll();
        assert!(!loader.is_loading("https://example.org/dog.jpg"));
        assert!(matches!(
            loader.current,
            Some(Thumbnail { state: ThumbnailState::Failed, .. })
        ));
    }

    #[test]
    fn test_disabled_loader_never_downloads() {
        let mut loader = ThumbnailLoader::disabled();
        assert!(loader.get("https://example.org/cat.jpg").is_none());
        assert!(loader.current.is_none());
    }

    #[test]
    fn test_stalled_host_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/cat.jpg", listener.local_addr().unwrap());
        // Accepts the connection but never answers.
        let _server = std::thread::spawn(move || {
            let held = listener.accept();
            std::thread::sleep(Duration::from_secs(5));
            drop(held);
        });

        let loader = ThumbnailLoader::with_picker(None, Duration::from_millis(200));
        let started = std::time::Instant::now();
        assert!(download(&loader.agent, &url).is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
