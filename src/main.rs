mod app;
mod braille;
mod config;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{Cli, Config};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::{event, execute};
use ratatui::DefaultTerminal;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::load(Cli::parse())?;
    let _guard = init_logging(&config.log_file)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = runtime.block_on(run(&mut terminal, config));

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; the terminal belongs to the map
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tui_choropleth=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Mouse motion hovers regions, left click drills down or resets to total
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
            app.mouse_moved(mouse.column, mouse.row);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            app.mouse_moved(mouse.column, mouse.row);
            app.clicked(mouse.column, mouse.row);
        }
        _ => {}
    }
}

async fn run(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(&config, size.width as usize, size.height as usize)?;
    app.spawn_stats_poller(config.stats.clone(), config.refresh);
    info!(catalog = %config.catalog.display(), "viewer started");

    // Main loop
    loop {
        app.update(Instant::now());

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                            KeyCode::Char('m') | KeyCode::Char('M') => app.cycle_metric(),
                            KeyCode::Char('z') | KeyCode::Char('Z') => app.toggle_zone(),
                            KeyCode::Backspace => app.back_to_country(),
                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }

        // Let loads and the stats poller make progress
        tokio::task::yield_now().await;
    }

    Ok(())
}
