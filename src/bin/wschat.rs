//! wschat - terminal chat over a WebSocket
//!
//! Opens one session to a chat endpoint and shows the conversation in a
//! full-screen terminal UI.
//!
//! # Usage
//!
//! ```text
//! wschat                                   # connect to ws://127.0.0.1:9001
//! wschat --url wss://chat.example.com/dev  # connect elsewhere
//! WSCHAT_URL=ws://10.0.0.5:9001 wschat     # same, via the environment
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use wschat_client::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT};
use wschat_client::error::{ChatError, Result as ChatResult};
use wschat_client::input::{handle_key_event, Action, Event};
use wschat_client::{ui, App, ChatClient, ChatConfig, ClientUpdate, SendOutcome};
use wschat_core::ConnectionStatus;

// ============================================================================
// CLI Arguments
// ============================================================================

/// wschat - realtime chat in the terminal
#[derive(Parser, Debug)]
#[command(name = "wschat")]
#[command(about = "Chat over a WebSocket endpoint")]
#[command(version)]
struct Args {
    /// WebSocket endpoint (ws:// or wss://)
    #[arg(long, short = 'u', env = "WSCHAT_URL", default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// Seconds to wait for the handshake before giving up
    #[arg(long, env = "WSCHAT_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    connect_timeout: u64,
}

// ============================================================================
// Terminal Setup / Cleanup
// ============================================================================

fn setup_terminal() -> ChatResult<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().map_err(|e| ChatError::TerminalInit(e.to_string()))?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| ChatError::TerminalInit(e.to_string()))?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| ChatError::TerminalInit(e.to_string()))
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> ChatResult<()> {
    disable_raw_mode().map_err(|e| ChatError::TerminalCleanup(e.to_string()))?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| ChatError::TerminalCleanup(e.to_string()))?;

    terminal
        .show_cursor()
        .map_err(|e| ChatError::TerminalCleanup(e.to_string()))?;

    Ok(())
}

// ============================================================================
// Keyboard Input Task
// ============================================================================

fn spawn_keyboard_task(
    event_tx: mpsc::UnboundedSender<Event>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if cancel_token.is_cancelled() {
                debug!("Keyboard task shutting down");
                break;
            }

            let poll_result = tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await;

            match poll_result {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if event_tx.send(Event::Key(key)).is_err() {
                        debug!("Event channel closed, keyboard task exiting");
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(width, height))) => {
                    if event_tx.send(Event::Resize(width, height)).is_err() {
                        break;
                    }
                }
                Ok(Some(_)) | Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Keyboard polling task panicked");
                    break;
                }
            }
        }
    })
}

// ============================================================================
// Main Event Loop
// ============================================================================

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    client: &mut ChatClient,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    cancel_token: &CancellationToken,
) -> Result<()> {
    let mut updates_done = false;

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            update = client.next_update(), if !updates_done => {
                match update {
                    Some(ClientUpdate::StatusChanged(ConnectionStatus::Closed)) => {
                        app.mark_closed(client.close_reason());
                    }
                    Some(update) => app.apply_update(update),
                    None => {
                        debug!("Connection finished, no more updates");
                        updates_done = true;
                    }
                }
            }

            event = event_rx.recv() => {
                match event {
                    Some(Event::Key(key)) => match handle_key_event(key, app) {
                        Action::Quit => {
                            info!("User requested quit");
                            break;
                        }
                        Action::Submit(text) => match client.send_text(&text) {
                            Ok(SendOutcome::Sent) => app.clear_input(),
                            Ok(SendOutcome::Suppressed) => {}
                            Err(e) => {
                                warn!(error = %e, "Send failed");
                                app.send_failed(&e);
                            }
                        },
                        Action::Disconnect => {
                            info!("User requested disconnect");
                            client.disconnect();
                        }
                        Action::None => {}
                    },
                    Some(Event::Resize(width, height)) => {
                        debug!(width, height, "Terminal resized");
                    }
                    None => {
                        warn!("Event channel closed");
                        break;
                    }
                }
            }

            _ = cancel_token.cancelled() => break,
        }

        if app.should_quit {
            break;
        }
    }

    cancel_token.cancel();
    Ok(())
}

// ============================================================================
// Logging Setup
// ============================================================================

fn get_log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("wschat"))
}

fn create_log_file() -> Option<fs::File> {
    let log_dir = get_log_dir()?;

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory {log_dir:?}: {e}");
        return None;
    }

    let log_path = log_dir.join("wschat.log");

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Failed to open log file {log_path:?}: {e}");
            None
        }
    }
}

fn init_logging() {
    if let Some(file) = create_log_file() {
        let writer = Mutex::new(file);

        let filter = EnvFilter::from_default_env().add_directive(
            "wschat=info"
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::Directive::from(tracing::Level::INFO)),
        );

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();

    let config = ChatConfig::new(&args.url)
        .with_connect_timeout(Duration::from_secs(args.connect_timeout));
    config.validate()?;

    info!(endpoint = %config.endpoint, "wschat starting");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let cancel_token = CancellationToken::new();

    let mut terminal = match setup_terminal() {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to initialize terminal");
            return Err(e.into());
        }
    };

    let mut app = App::new(&config.endpoint);
    let mut client = ChatClient::new(config);

    let result = match client.open() {
        Ok(()) => {
            let keyboard_handle = spawn_keyboard_task(event_tx, cancel_token.clone());
            let result =
                run_event_loop(&mut terminal, &mut app, &mut client, &mut event_rx, &cancel_token)
                    .await;
            let _ = tokio::time::timeout(Duration::from_millis(100), keyboard_handle).await;
            result
        }
        Err(e) => Err(e.into()),
    };

    client.disconnect();
    drop(client);

    if let Err(e) = cleanup_terminal(&mut terminal) {
        error!(error = %e, "Failed to cleanup terminal");
    }

    info!("wschat stopped");

    result
}
