use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use ratatui_image::{Resize, StatefulImage};

use super::thumbnail::ThumbnailLoader;
use crate::encyclopedia::SummaryResult;
use crate::search::{RenderState, RequestId, SearchUpdate};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// The single output region. Holds at most one state; each update replaces it.
#[derive(Debug, Default)]
pub struct OutputPanel {
    pub state: Option<RenderState>,
    /// Search that produced `state`.
    shown: Option<RequestId>,
    tick: usize,
}

impl OutputPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the shown state. Updates from a search older than the one on
    /// screen are ignored.
    pub fn apply(&mut self, update: SearchUpdate) -> bool {
        if self.shown.is_some_and(|shown| update.id < shown) {
            tracing::debug!(id = update.id.0, "Ignoring out-of-order update");
            return false;
        }
        self.shown = Some(update.id);
        self.state = Some(update.state);
        true
    }

    /// Thumbnail url of the card on screen, if any.
    pub fn image_url(&self) -> Option<&str> {
        match self.state {
            Some(RenderState::Result(ref summary)) => summary.image_url.as_deref(),
            _ => None,
        }
    }

    /// Advance the spinner; called once per UI tick.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, Some(RenderState::Status(_)))
    }
}

pub fn render(frame: &mut Frame, panel: &OutputPanel, thumbnails: &mut ThumbnailLoader, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Result ");

    match panel.state {
        None => {
            let hint = Paragraph::new("Type an animal name or enter the path of a photo.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(hint, area);
        }
        Some(RenderState::Status(ref message)) => {
            let spinner = SPINNER[panel.tick % SPINNER.len()];
            let status = Paragraph::new(format!("{} {}", spinner, message))
                .style(Style::default().fg(Color::Cyan))
                .block(block);
            frame.render_widget(status, area);
        }
        Some(RenderState::Error(ref message)) => {
            let error = Paragraph::new(message.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block.border_style(Style::default().fg(Color::Red)));
            frame.render_widget(error, area);
        }
        Some(RenderState::Result(ref summary)) => {
            render_card(frame, summary, thumbnails, block, area);
        }
    }
}

fn render_card(
    frame: &mut Frame,
    summary: &SummaryResult,
    thumbnails: &mut ThumbnailLoader,
    block: Block,
    area: Rect,
) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let show_image = summary.image_url.is_some() && thumbnails.is_available() && inner.width >= 40;

    let (image_area, text_area) = if show_image {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(inner);
        (Some(chunks[0]), chunks[1])
    } else {
        (None, inner)
    };

    if let (Some(image_area), Some(url)) = (image_area, summary.image_url.as_deref()) {
        if let Some(protocol) = thumbnails.get(url) {
            let image = StatefulImage::new(None).resize(Resize::Fit(None));
            frame.render_stateful_widget(image, image_area, protocol);
        } else if thumbnails.is_loading(url) {
            let loading = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                .alignment(Alignment::Center);
            frame.render_widget(loading, image_area);
        }
    }

    let lines = vec![
        Line::from(Span::styled(
            summary.title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(summary.description.clone()),
    ];

    let text = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(text, text_area.inner(Margin::new(1, 0)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_update_replaces_the_previous_state() {
        let mut panel = OutputPanel::new();
        assert!(panel.state.is_none());

        panel.apply(SearchUpdate {
            id: RequestId(1),
            state: RenderState::Status("Searching...".into()),
        });
        assert!(panel.is_busy());

        panel.apply(SearchUpdate {
            id: RequestId(1),
            state: RenderState::Result(SummaryResult::not_found("cat")),
        });
        assert!(!panel.is_busy());
        assert_eq!(
            panel.state,
            Some(RenderState::Result(SummaryResult::not_found("cat")))
        );
    }

    #[test]
    fn test_older_search_cannot_overwrite_newer() {
        let mut panel = OutputPanel::new();
        assert!(panel.apply(SearchUpdate {
            id: RequestId(2),
            state: RenderState::Status("Searching...".into()),
        }));

        assert!(!panel.apply(SearchUpdate {
            id: RequestId(1),
            state: RenderState::Error("late".into()),
        }));
        assert_eq!(panel.state, Some(RenderState::Status("Searching...".into())));

        let card = SummaryResult {
            title: "Cat".into(),
            description: "A small mammal.".into(),
            image_url: Some("https://example.org/cat.jpg".into()),
        };
        assert!(panel.apply(SearchUpdate {
            id: RequestId(2),
            state: RenderState::Result(card),
        }));
        assert_eq!(panel.image_url(), Some("https://example.org/cat.jpg"));
    }
}
