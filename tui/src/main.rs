//! famstar - terminal client for the family star-voting app.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use famstar_core::{Controller, SupabaseBackend, UiEvent};
use famstar_tui::App;

/// Set `FAMSTAR_LOG=/path/to/file` to capture tracing output without
/// disturbing the terminal UI.
fn init_logging() {
    let Ok(path) = std::env::var("FAMSTAR_LOG") else {
        return;
    };
    match std::fs::File::create(&path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        Err(err) => eprintln!("cannot open log file {path}: {err}"),
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = famstar_core::load_config().context(
        "could not load the famstar config; set FAMSTAR_CONFIG or create the default file",
    )?;
    let backend = Arc::new(SupabaseBackend::new(
        &config.backend.url,
        &config.backend.anon_key,
    ));

    let (tx, rx) = mpsc::channel(100);
    let mut controller = Controller::new(config.directory(), backend, tx);
    controller.handle_event(UiEvent::Start).await;

    // Whatever happens, leave the terminal usable.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(controller, rx)?;
    let result = app.run(&mut terminal).await;
    restore_terminal();

    result
}
