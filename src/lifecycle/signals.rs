//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second SIGTERM/SIGINT forces exit
//! - SIGHUP requests a resync, not shutdown

use tokio::sync::mpsc;

use crate::lifecycle::Shutdown;
use crate::sync::Trigger;

/// Listen for signals until the process exits.
#[cfg(unix)]
pub async fn listen(shutdown: Shutdown, triggers: mpsc::Sender<Trigger>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = terminate.recv() => stop(&shutdown, "SIGTERM"),
            _ = interrupt.recv() => stop(&shutdown, "SIGINT"),
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, requesting resync");
                // A full queue already holds a pending request.
                let _ = triggers.try_send(Trigger::Requested);
            }
        }
    }
}

#[cfg(not(unix))]
pub async fn listen(shutdown: Shutdown, _triggers: mpsc::Sender<Trigger>) -> std::io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        stop(&shutdown, "Ctrl+C");
    }
}

fn stop(shutdown: &Shutdown, name: &str) {
    if shutdown.is_triggered() {
        tracing::warn!(signal = name, "Second shutdown signal, forcing exit");
        std::process::exit(1);
    }
    tracing::info!(signal = name, "Shutdown signal received");
    shutdown.trigger();
}
