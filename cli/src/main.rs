//! Megawave CLI - binary entry point and interactive loop.
//!
//! # Architecture
//!
//! ```text
//! main() -> Config::resolve -> telemetry::init -> run_interactive()
//!                                                   |
//!                              KeyPump -> Command -> Oven (megawave_core)
//!                                                   |
//!                                            TerminalPanel (stdout)
//! ```
//!
//! Each Enter spawns `Oven::press_start` on its own task so the loop keeps
//! reading keys during a countdown. Ctrl-C (a key event in raw mode),
//! SIGINT, and SIGTERM all cancel one shutdown token; cook tasks run under
//! child tokens of it.

mod input;
mod telemetry;

use std::io::{Write, stdout};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use input::{Command, InputMsg, KeyPump};
use megawave_config::{Cli, Config};
use megawave_core::{DisplayPanel, Oven, OvenMetrics, Readout, StartOutcome};

/// RAII raw mode: restored on drop, including on early returns and errors.
struct TerminalSession;

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode().context("failed to set raw mode")?;
        Ok(Self)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Prints each readout on its own line. Raw mode needs the explicit `\r`.
struct TerminalPanel;

impl DisplayPanel for TerminalPanel {
    fn show(&self, readout: Readout) {
        let mut out = stdout().lock();
        let _ = write!(out, "{readout}\r\n");
        let _ = out.flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (file, file_error) = match cli.load_file() {
        Ok(file) => (file, None),
        Err(e) => (None, Some(e)),
    };
    let config = Config::resolve(&cli, file.as_ref());

    let telemetry = telemetry::init(&config)?;
    if let Some(e) = file_error {
        warn!(path = %e.path().display(), "Ignoring config file: {e}");
    }
    info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "megawave starting"
    );

    let metrics = Arc::new(OvenMetrics::new());
    let oven = Arc::new(
        Oven::builder()
            .meter(telemetry.meter(metrics.clone()))
            .panel(Arc::new(TerminalPanel))
            .build(),
    );

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    print_instructions();

    let result = run_interactive(&oven, &shutdown).await;

    info!(
        button_presses = metrics.total_button_presses(),
        cooking_sessions = metrics.cooking_sessions(),
        "session summary"
    );
    debug!("metrics:\n{}", metrics.export_prometheus());

    println!("\nGoodbye!");
    result
}

fn print_instructions() {
    println!("╔════════════════════════════════════════╗");
    println!("║         MEGAWAVE MICROWAVE             ║");
    println!("╠════════════════════════════════════════╣");
    println!("║  Controls:                             ║");
    println!("║    0-9       : Enter time digits       ║");
    println!("║    Enter     : Start cooking           ║");
    println!("║    Ctrl-C    : Exit                    ║");
    println!("╠════════════════════════════════════════╣");
    println!("║  Display format: MM:SS                 ║");
    println!("║  Example: Press 1,3,5 for 01:35        ║");
    println!("╚════════════════════════════════════════╝");
    println!();
    println!("Ready. Enter time and press Enter to start.");
    println!();
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let _drop = shutdown.drop_guard();
        wait_for_signal().await;
        info!("shutdown signal received");
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn run_interactive(oven: &Arc<Oven>, shutdown: &CancellationToken) -> Result<()> {
    let _session = TerminalSession::new()?;
    let mut keys = KeyPump::new();
    let mut cooks: JoinSet<StartOutcome> = JoinSet::new();

    let result = loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break Ok(()),
            Some(done) = cooks.join_next(), if !cooks.is_empty() => {
                match done {
                    Ok(outcome) => debug!(?outcome, "start finished"),
                    Err(e) => warn!("cook task failed: {e}"),
                }
            }
            msg = keys.recv() => match msg {
                None => break Ok(()),
                Some(InputMsg::Error(e)) => break Err(anyhow!("terminal input failed: {e}")),
                Some(InputMsg::Event(event)) => match Command::from_event(&event) {
                    Some(Command::Digit(digit)) => oven.press_digit(digit),
                    Some(Command::Start) => {
                        let oven = Arc::clone(oven);
                        let cancel = shutdown.child_token();
                        cooks.spawn(async move { oven.press_start(&cancel).await });
                    }
                    Some(Command::Quit) => {
                        shutdown.cancel();
                        break Ok(());
                    }
                    None => {}
                },
            },
        }
    };

    // Let in-flight cooks observe cancellation and run their reset.
    shutdown.cancel();
    while let Some(done) = cooks.join_next().await {
        if let Ok(outcome) = done {
            debug!(?outcome, "start finished");
        }
    }
    keys.shutdown().await;

    result
}
