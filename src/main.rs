//! Recipe Explorer - browse TheMealDB recipes from the terminal
//!
//! A terminal menu for searching recipes, reading them in full and keeping a
//! list of favorites. API responses are cached on disk for 24 hours and served
//! stale when the API cannot be reached.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use recipe_explorer::app::{App, AppState};
use recipe_explorer::cli::{Cli, StartupConfig};
use recipe_explorer::explorer::Explorer;
use recipe_explorer::{logging, ui};

/// Exit code for invalid command-line values
const EXIT_USAGE: u8 = 1;

/// Exit code for I/O failures before the menu could start
const EXIT_STARTUP: u8 = 2;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Menu => ui::render_menu(frame, app),
        AppState::Prompt(kind) => ui::render_prompt(frame, app, *kind),
        AppState::Results => ui::render_results(frame, app),
        AppState::Detail => ui::render_recipe_detail(frame, app),
        AppState::Favorites => ui::render_favorites(frame, app),
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Runs the menu until the user quits
async fn run_tui(mut app: App) -> io::Result<()> {
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        // Run queued work after the busy notice has been drawn
        if app.is_busy() {
            app.run_pending().await;
            continue;
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let config = match startup.build_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    if let Err(e) = logging::init(&config.log_path) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let explorer = match Explorer::new(&config) {
        Ok(explorer) => explorer,
        Err(e) => {
            error!(error = %e, "cannot build HTTP client");
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };
    explorer.cache().ensure_initialized().await;

    if startup.evict_only {
        let removed = explorer.evict_expired().await;
        println!("Removed {} expired cache entries", removed);
        return ExitCode::SUCCESS;
    }

    info!(
        cache = %config.cache_path.display(),
        api = %config.api_base_url,
        "starting recipe explorer"
    );

    match run_tui(App::with_startup_config(explorer, &startup)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "terminal failure");
            eprintln!("Error: terminal failure: {}", e);
            ExitCode::from(EXIT_STARTUP)
        }
    }
}
