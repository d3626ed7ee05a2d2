use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::classifier::OnnxClassifier;
use crate::config::Config;
use crate::encyclopedia::WikipediaClient;
use crate::filter::ResultFilter;
use crate::preprocess::Preprocessor;
use crate::search::{
    ChannelRenderer, Debouncer, Renderer, SearchInput, SearchOrchestrator, SearchUpdate, Trigger,
};
use crate::ui;
use crate::ui::input::TextField;
use crate::ui::output::OutputPanel;
use crate::ui::thumbnail::ThumbnailLoader;

/// Which input field receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Name,
    Image,
}

/// Build the production orchestrator: ONNX classifier, Wikipedia lookups.
pub fn wire_orchestrator(config: &Config, renderer: Arc<dyn Renderer>) -> SearchOrchestrator {
    SearchOrchestrator::new(
        Preprocessor::new(&config.preprocess),
        Arc::new(OnnxClassifier::new(config.classifier.clone())),
        ResultFilter::new(&config.filter),
        Arc::new(WikipediaClient::from_config(&config.encyclopedia)),
        renderer,
    )
}

/// Expand a leading `~/` in a typed path.
fn expand_path(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(input)
}

pub struct App {
    pub config: Config,
    pub name_field: TextField,
    pub image_field: TextField,
    pub focus: Focus,
    pub output: OutputPanel,
    pub thumbnails: ThumbnailLoader,
    pub should_quit: bool,
    orchestrator: Arc<SearchOrchestrator>,
    updates: mpsc::Receiver<SearchUpdate>,
    debouncer: Debouncer,
}

impl App {
    /// Must be called after the terminal is set up: thumbnail support is
    /// detected by querying it.
    pub fn new(config: Config) -> Self {
        let (renderer, updates) = ChannelRenderer::new();
        let orchestrator = wire_orchestrator(&config, Arc::new(renderer));
        let thumbnails = ThumbnailLoader::new(
            config.preview.protocol,
            Duration::from_secs(config.encyclopedia.timeout_secs),
        );
        Self::with_parts(config, Arc::new(orchestrator), updates, thumbnails)
    }

    pub fn with_parts(
        config: Config,
        orchestrator: Arc<SearchOrchestrator>,
        updates: mpsc::Receiver<SearchUpdate>,
        thumbnails: ThumbnailLoader,
    ) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(config.search.debounce_ms));
        Self {
            config,
            name_field: TextField::new(),
            image_field: TextField::new(),
            focus: Focus::Name,
            output: OutputPanel::new(),
            thumbnails,
            should_quit: false,
            orchestrator,
            updates,
            debouncer,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.tick(Instant::now());

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key, Instant::now());
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply finished renders and fire the debounced text search when due.
    pub fn tick(&mut self, now: Instant) {
        for update in self.updates.try_iter() {
            self.output.apply(update);
        }
        self.thumbnails.retain(self.output.image_url());
        self.output.tick();

        if let Some(text) = self.debouncer.poll(now) {
            let input = SearchInput {
                image: self.selected_image(),
                text,
            };
            self.spawn_search(Trigger::TextChanged, input);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Name => Focus::Image,
                    Focus::Image => Focus::Name,
                };
            }
            KeyCode::Enter => match self.focus {
                Focus::Name => {
                    // The explicit submit covers whatever was pending.
                    self.debouncer.cancel();
                    self.trigger(Trigger::Submit);
                }
                Focus::Image => self.trigger(Trigger::FileSelected),
            },
            KeyCode::Char('u') if ctrl => {
                self.focused_field().clear();
                self.after_edit(now);
            }
            KeyCode::Char(c) => {
                self.focused_field().handle_char(c);
                self.after_edit(now);
            }
            KeyCode::Backspace => {
                self.focused_field().backspace();
                self.after_edit(now);
            }
            KeyCode::Delete => {
                self.focused_field().delete();
                self.after_edit(now);
            }
            KeyCode::Left => self.focused_field().move_cursor_left(),
            KeyCode::Right => self.focused_field().move_cursor_right(),
            KeyCode::Home => self.focused_field().move_cursor_home(),
            KeyCode::End => self.focused_field().move_cursor_end(),
            _ => {}
        }
    }

    fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            Focus::Name => &mut self.name_field,
            Focus::Image => &mut self.image_field,
        }
    }

    /// Name edits rearm the debouncer; a blank name cancels it.
    fn after_edit(&mut self, now: Instant) {
        if self.focus != Focus::Name {
            return;
        }
        match self.name_field.trimmed() {
            Some(text) => self.debouncer.input(text, now),
            None => self.debouncer.cancel(),
        }
    }

    fn selected_image(&self) -> Option<PathBuf> {
        self.image_field.trimmed().map(expand_path)
    }

    fn trigger(&mut self, trigger: Trigger) {
        let input = SearchInput {
            image: self.selected_image(),
            text: self.name_field.value.clone(),
        };
        self.spawn_search(trigger, input);
    }

    fn spawn_search(&self, trigger: Trigger, input: SearchInput) {
        let orchestrator = Arc::clone(&self.orchestrator);
        std::thread::spawn(move || {
            orchestrator.run(trigger, input);
        });
    }
}
