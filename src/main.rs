use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use animalid::app::{wire_orchestrator, App};
use animalid::config::Config;
use animalid::console::{format_state, ConsoleRenderer};
use animalid::logging;
use animalid::search::{RenderState, RunOutcome, SearchInput, Trigger};

#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<PathBuf>,
    name: Option<String>,
    image: Option<PathBuf>,
}

impl CliArgs {
    fn is_one_shot(&self) -> bool {
        self.name.is_some() || self.image.is_some()
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("animalid {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            flag @ ("--config" | "-c" | "--name" | "-n" | "--image" | "-i") => {
                if i + 1 >= args.len() {
                    eprintln!("Error: {} requires an argument", flag);
                    std::process::exit(1);
                }
                let value = args[i + 1].clone();
                match flag {
                    "--config" | "-c" => cli.config_path = Some(PathBuf::from(value)),
                    "--name" | "-n" => cli.name = Some(value),
                    _ => cli.image = Some(PathBuf::from(value)),
                }
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn print_help() {
    println!(
        r#"animalid - identify an animal from a photo or a name

USAGE:
    animalid [OPTIONS]

OPTIONS:
    --name, -n TEXT     Look up an animal by name and print the summary
    --image, -i PATH    Identify the animal in a photo and print the summary
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

Without --name or --image the interactive terminal UI starts.
A photo takes priority when both are given.

ENVIRONMENT:
    ANIMALID_CONFIG     Path to config file (overrides default location)
    ANIMALID_LOG        Log filter (e.g. debug, or animalid=debug,ort=info)

Config file location: $XDG_CONFIG_HOME/animalid/config.toml
Log files (when journald is unavailable): {}"#,
        logging::default_log_dir().display()
    );
}

fn run_once(config: &Config, cli: CliArgs) -> Result<()> {
    let orchestrator = wire_orchestrator(config, Arc::new(ConsoleRenderer));
    let input = SearchInput {
        image: cli.image,
        text: cli.name.unwrap_or_default(),
    };

    let state = match orchestrator.run(Trigger::Submit, input) {
        RunOutcome::Rendered(state) | RunOutcome::Superseded(state) => state,
        RunOutcome::Dropped => return Ok(()),
    };

    println!("{}", format_state(&state));

    if matches!(state, RenderState::Error(_)) {
        std::process::exit(1);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(None);

    let config = match cli.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if cli.is_one_shot() {
        return run_once(&config, cli);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
