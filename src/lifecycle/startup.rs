//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the initial template (fatal on failure)
//! - Seed the committed configuration when none exists yet
//! - Start the proxy process (fatal on failure)
//! - Start watchers, reconciler, admin API, signal handling
//!
//! # Design Decisions
//! - Fail fast on template and environment errors; a rejected desired
//!   state is seeded as empty instead
//! - Subsystems initialize in order, not concurrently
//! - The proxy starts before the first reconcile so reloads have a target

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin::{self, AdminState};
use crate::config::{ControllerConfig, FileWatcher};
use crate::error::{SyncError, TemplateReloadError};
use crate::lifecycle::{signals, Shutdown};
use crate::model::{load_state, DesiredState};
use crate::observability::metrics;
use crate::process::{NginxProcess, ProcessControl, ProcessState, Supervisor};
use crate::sync::{Reconciler, StatusBoard, SyncController, SyncSettings, Trigger};
use crate::template::{store, TemplateStore};

/// Error that stops the controller before it can reconcile.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid template: {0}")]
    Template(#[from] TemplateReloadError),

    #[error("failed to prepare initial configuration: {0}")]
    Seed(SyncError),

    #[error("failed to start proxy: {0}")]
    Process(SyncError),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run the controller until shutdown.
pub async fn run(config: ControllerConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // 1. Template
    let template_path = PathBuf::from(&config.template.path);
    let templates = Arc::new(TemplateStore::load(&template_path)?);
    metrics::record_template_generation(templates.generation());

    // 2. Controller
    let control: Arc<dyn ProcessControl> = Arc::new(NginxProcess::new(
        &config.process.binary,
        &config.process.config_path,
    ));
    let controller = Arc::new(SyncController::new(
        control.clone(),
        templates.clone(),
        SyncSettings::from_config(&config),
    ));

    // 3. Committed configuration must exist before the proxy starts.
    let state_path = PathBuf::from(&config.state.path);
    seed_committed(&controller, &state_path)
        .await
        .map_err(StartupError::Seed)?;

    // 4. Proxy process
    let supervisor = Supervisor::start(control.as_ref(), Path::new(&config.process.config_path))
        .await
        .map_err(StartupError::Process)?;

    // 5. Watchers
    let (trigger_tx, trigger_rx) = mpsc::channel(8);
    let mut watchers = Vec::new();

    if config.template.watch {
        let (watcher, changes) = FileWatcher::new(&template_path);
        watchers.push(watcher.run().map_err(|source| StartupError::Watch {
            path: template_path.clone(),
            source,
        })?);
        tokio::spawn(store::run_reload_loop(
            templates.clone(),
            changes,
            shutdown.subscribe(),
        ));
    }

    if config.state.watch {
        let (watcher, mut changes) = FileWatcher::new(&state_path);
        watchers.push(watcher.run().map_err(|source| StartupError::Watch {
            path: state_path.clone(),
            source,
        })?);
        let tx = trigger_tx.clone();
        tokio::spawn(async move {
            while changes.recv().await.is_some() {
                if tx.try_send(Trigger::StateChanged).is_err() && tx.is_closed() {
                    break;
                }
            }
        });
    }

    // 6. Signals
    {
        let shutdown = shutdown.clone();
        let tx = trigger_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = signals::listen(shutdown, tx).await {
                tracing::error!(error = %e, "Failed to install signal handlers");
            }
        });
    }

    // 7. Admin API
    let status = Arc::new(StatusBoard::new());
    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                address: config.admin.bind_address.clone(),
                source,
            })?;
        let state = AdminState {
            status: status.clone(),
            process: Some(supervisor.subscribe()),
            triggers: trigger_tx.clone(),
            api_key: config.admin.api_key.clone().map(Arc::from),
        };
        let admin_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    // 8. Process exits are reported, not restarted.
    {
        let mut process = supervisor.subscribe();
        tokio::spawn(async move {
            while process.changed().await.is_ok() {
                if let ProcessState::Exited { .. } = *process.borrow() {
                    tracing::error!(
                        "Proxy process is no longer running; reloads will fail until it is restarted"
                    );
                    break;
                }
            }
        });
    }

    // 9. Reconcile until shutdown
    let reconciler = Reconciler::new(
        controller,
        &state_path,
        status,
        &config.retry,
        Duration::from_secs(config.state.resync_interval_secs),
    );
    reconciler.run(trigger_rx, shutdown.subscribe()).await;

    drop(watchers);
    shutdown.trigger();
    Ok(())
}

/// Write an initial configuration when nothing is committed yet.
///
/// Uses the desired state if it can be read and yields a valid candidate, an
/// empty state otherwise; the reconciler reports the bad state on its first
/// cycle. Only environment failures are returned. No reload is signalled:
/// nothing runs yet.
pub async fn seed_committed(
    controller: &SyncController,
    state_path: &Path,
) -> Result<(), SyncError> {
    let committed = &controller.settings().config_path;
    if committed.exists() {
        return Ok(());
    }

    let state = match load_state(state_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "Desired state unavailable, seeding with an empty state");
            DesiredState::default()
        }
    };

    match controller.seed(&state).await {
        Ok(()) => {}
        Err(e @ (SyncError::Validation { .. } | SyncError::Render(_))) => {
            tracing::error!(
                kind = e.kind(),
                "Desired state rejected at startup, seeding with an empty state: {}",
                e
            );
            controller.seed(&DesiredState::default()).await?;
        }
        Err(e) => return Err(e),
    }

    tracing::info!(path = %committed.display(), "Seeded initial configuration");
    Ok(())
}
