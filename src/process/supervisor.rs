//! Foreground process supervision.
//!
//! # Responsibilities
//! - Start the proxy once, attached to our stdout/stderr
//! - Observe the exit and publish it
//!
//! # Design Decisions
//! - A failed start is returned to the caller, which treats it as fatal
//! - An exit after a successful start is reported, never restarted here

use std::path::Path;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::SyncError;
use crate::process::control::{ExitReport, ProcessControl};

/// Observable state of the managed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessState {
    Running {
        pid: Option<u32>,
    },
    Exited {
        success: bool,
        code: Option<i32>,
        error: Option<String>,
    },
}

impl From<ExitReport> for ProcessState {
    fn from(report: ExitReport) -> Self {
        ProcessState::Exited {
            success: report.success,
            code: report.code,
            error: report.error,
        }
    }
}

/// Owns the lifetime of the managed process.
pub struct Supervisor {
    state: watch::Receiver<ProcessState>,
}

impl Supervisor {
    /// Start the process using the configuration at `config_path`.
    pub async fn start(
        control: &dyn ProcessControl,
        config_path: &Path,
    ) -> Result<Self, SyncError> {
        tracing::info!(
            binary = %control.name(),
            config = %config_path.display(),
            "Starting proxy process"
        );

        let handle = control
            .run(config_path)
            .await
            .map_err(|e| SyncError::environment("starting proxy process", e))?;

        let pid = handle.pid;
        let (state_tx, state_rx) = watch::channel(ProcessState::Running { pid });
        tracing::info!(pid = ?pid, "Proxy process started");

        let exit = handle.exit;
        tokio::spawn(async move {
            let report = exit.await.unwrap_or_else(|_| ExitReport {
                success: false,
                code: None,
                error: Some("exit status was never reported".to_string()),
            });

            if report.success {
                tracing::info!(pid = ?pid, "Proxy process exited");
            } else {
                tracing::error!(
                    pid = ?pid,
                    code = ?report.code,
                    error = ?report.error,
                    "Proxy process exited with failure"
                );
            }
            let _ = state_tx.send(report.into());
        });

        Ok(Self { state: state_rx })
    }

    /// Current process state.
    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    /// Receiver that observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state.clone()
    }

    /// Wait until the process has exited.
    pub async fn wait(&mut self) -> ProcessState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if let ProcessState::Exited { .. } = current {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state();
            }
        }
    }
}
