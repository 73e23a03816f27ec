mod app;
mod config;
mod panel;
mod theme;
mod transfer;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::AppConfig;
use transfer::client::TransferClient;

#[derive(Parser, Debug)]
#[command(name = "hakobu")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly file transfer manager for remote storage collections")]
struct Args {
    /// Search collections and print the matches as JSON
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Activate a collection and print its directory listing as JSON
    #[arg(short, long, value_name = "ENDPOINT_ID")]
    list: Option<String>,

    /// Directory to list (used with --list, defaults to the configured path)
    #[arg(short, long)]
    path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Handle CLI-only commands
    if let Some(query) = args.search {
        return print_search(&query).await;
    }

    if let Some(endpoint_id) = args.list {
        return print_listing(&endpoint_id, args.path.as_deref()).await;
    }

    // Run TUI
    run_tui().await
}

async fn print_search(query: &str) -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    let client = TransferClient::new(&config)?;
    let endpoints = client.search(query).await?;
    println!("{}", serde_json::to_string_pretty(&endpoints)?);
    Ok(())
}

async fn print_listing(endpoint_id: &str, path: Option<&str>) -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    let client = TransferClient::new(&config)?;

    // Activation must succeed before the listing is available
    client.activate(endpoint_id).await?;

    let path = path.unwrap_or(&config.default_path);
    let entries = client.list_directory(endpoint_id, path).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

async fn run_tui() -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new()?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') | KeyCode::Char('q')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Drive the search debounce and transient status messages
        let _ = app.tick().await;
    }
}
