//! Genesis n-Badge - claim the soulbound OPN Chain testnet badge
//!
//!   ╔═══════════════════════════╗
//!   ║   G E N E S I S  n-Badge  ║
//!   ╚═══════════════════════════╝
//!   connect  ─▶  watch  ─▶  claim

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod chain;
mod claim;
mod config;
mod eth;
mod nav;
mod rpc;
mod screens;
mod wallet;

use app::{App, AppMessage};
use config::{AppConfig, Settings};

#[derive(Parser, Debug)]
#[command(name = "badge")]
#[command(about = "Genesis n-Badge - claim the soulbound OPN Chain testnet badge")]
#[command(version)]
struct Cli {
    /// App id presented to the wallet provider
    #[arg(long, env = "BADGE_WALLET_APP_ID", default_value = config::DEFAULT_WALLET_APP_ID)]
    wallet_app_id: String,

    /// Video shown before the claim step
    #[arg(long, env = "BADGE_VIDEO_URL", default_value = config::DEFAULT_VIDEO_URL)]
    video_url: String,

    /// Badge contract address
    #[arg(long, env = "BADGE_CONTRACT_ADDRESS", default_value = config::DEFAULT_CONTRACT_ADDRESS)]
    contract_address: String,

    /// EIP-1193 JSON-RPC wallet endpoint
    #[arg(long, env = "BADGE_WALLET_URL", default_value = config::DEFAULT_WALLET_URL)]
    wallet_url: String,

    /// Chain RPC endpoint (defaults to the OPN Testnet public RPC)
    #[arg(long, env = "BADGE_RPC_URL")]
    rpc_url: Option<String>,

    /// Start on a route (`video`, `claim`); overrides the saved one
    #[arg(short, long)]
    route: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file; stdout belongs to the terminal UI.
    let file_appender = tracing_appender::rolling::daily(AppConfig::dir(), "badge.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    let rpc_url = cli
        .rpc_url
        .unwrap_or_else(|| chain::OPN_TESTNET.rpc_urls[0].to_string());
    let settings = Settings::new(
        cli.wallet_app_id,
        cli.video_url,
        &cli.contract_address,
        cli.wallet_url,
        rpc_url,
    )?;
    tracing::info!(
        contract = %settings.contract_address,
        wallet = %settings.wallet_url,
        rpc = %settings.rpc_url,
        "starting"
    );

    // Create app
    let mut app = App::new(settings, cli.route)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create message channel for async operations
    let (tx, mut rx) = mpsc::channel::<AppMessage>(32);

    // Mount the first screen
    app.start(tx.clone());

    // Run app
    let result = run_app(&mut terminal, &mut app, tx, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "exited with error");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: mpsc::Sender<AppMessage>,
    rx: &mut mpsc::Receiver<AppMessage>,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| app.render(f))?;

        // Handle async messages
        while let Ok(msg) = rx.try_recv() {
            app.handle_message(msg, tx.clone()).await?;
        }

        // Poll for events with timeout
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Global quit, held back while a claim is in flight
                    if key.code == KeyCode::Char('q') && app.can_quit() {
                        return Ok(());
                    }

                    // Let app handle key
                    app.handle_key(key.code, tx.clone()).await?;
                }
            }
        }

        // Check if app wants to quit
        if app.should_quit() {
            return Ok(());
        }
    }
}
