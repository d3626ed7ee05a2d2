pub mod input;
pub mod output;
pub mod thumbnail;

use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::{App, Focus};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Animal name
            Constraint::Length(3), // Image path
            Constraint::Min(5),    // Output region
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let title = Line::from(vec![Span::styled(
        " animalid - identify an animal by name or photo ",
        Style::default().fg(Color::White).bg(Color::DarkGray),
    )]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    input::render(frame, &app.name_field, "Animal name", app.focus == Focus::Name, chunks[1]);
    input::render(
        frame,
        &app.image_field,
        "Image path (jpg, png, webp)",
        app.focus == Focus::Image,
        chunks[2],
    );

    output::render(frame, &app.output, &mut app.thumbnails, chunks[3]);

    render_footer(frame, app, chunks[4]);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hint = match app.focus {
        Focus::Name => " Enter: search | Tab: image path | Ctrl+U: clear | Esc: quit ",
        Focus::Image => " Enter: identify photo | Tab: animal name | Ctrl+U: clear | Esc: quit ",
    };

    let footer = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}
