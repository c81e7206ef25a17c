//! DGolf TUI - an offline-first terminal client for DGolf golf travel.
//!
//! Browses destinations and articles through a versioned offline cache,
//! with token-based login and an adaptive layout that follows the
//! terminal geometry.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dgolf_core::api::ApiClient;
use dgolf_core::auth::{AuthManager, CredentialStore};
use dgolf_core::cache::{CacheConfig, OfflineController, Registration};
use dgolf_core::config::AppConfig;
use dgolf_core::sync::InquiryOutbox;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

fn env_filter() -> EnvFilter {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a rolling file: the terminal belongs to the UI.
fn init_file_tracing(cache_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::daily(cache_dir.join("logs"), "dgolf.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    guard
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--sync" {
        init_stderr_tracing();
        return run_sync(config).await;
    }

    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)?;
    let _guard = init_file_tracing(&cache_dir);
    info!("DGolf TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (cols, rows) = crossterm::terminal::size()?;
    let mut app = App::new(config, cols, rows)?;
    app.startup().await?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("DGolf TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with timeout so background updates keep flowing
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    // Ctrl+C always quits
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }
                    if handle_input(app, key).await? {
                        return Ok(());
                    }
                }
                Event::Resize(cols, rows) => {
                    app.on_resize(cols, rows);
                }
                _ => {}
            }
        }

        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Headless cache refresh: `dgolf --sync`.
///
/// Restores the stored session (or logs in with keychain credentials,
/// prompting only for what is missing), installs the cache controller,
/// warms the catalog routes, and flushes any queued inquiries.
async fn run_sync(config: AppConfig) -> Result<()> {
    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)?;

    let api = ApiClient::new(config.clone())?;
    let mut auth = AuthManager::new(api.clone(), cache_dir.clone());
    auth.restore().await?;

    if !auth.is_authenticated() {
        let email = match config.last_email {
            Some(ref email) => email.clone(),
            None => {
                print!("Email: ");
                io::stdout().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                input.trim().to_string()
            }
        };

        let password = match CredentialStore::get_password(&email) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password(format!("Password for {email}: "))?,
        };

        match auth.login(&email, &password).await {
            Ok(user) => eprintln!("Signed in as {}", user.full_name),
            Err(e) => {
                // Catalog routes are public; sync continues unauthenticated.
                eprintln!("Login failed: {}", e.user_message("check your credentials"));
            }
        }
    }

    let mut registration = Registration::new();
    let controller = OfflineController::new(
        cache_dir.join("responses"),
        config.api_base_url.clone(),
        CacheConfig::default(),
        std::sync::Arc::new(api.clone()),
    )?;
    registration.register(controller).await?;

    let controller = registration
        .active()
        .ok_or_else(|| anyhow::anyhow!("No active cache controller after registration"))?;

    let base = &config.api_base_url;
    for path in ["/api/destinations", "/api/articles"] {
        let request = dgolf_core::cache::FetchRequest::get(format!("{base}{path}"));
        match controller.route(&request).await {
            dgolf_core::cache::RouteOutcome::Response(response) => {
                println!("{path}: {}", response.status);
            }
            dgolf_core::cache::RouteOutcome::Bypass => {}
        }
    }

    let outbox = InquiryOutbox::new(cache_dir);
    let flushed = outbox.flush(&api).await?;
    if flushed > 0 {
        println!("Submitted {flushed} queued inquiries");
    }

    println!(
        "Cache {} ready",
        registration.active_version().unwrap_or_default()
    );
    Ok(())
}
