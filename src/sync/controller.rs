//! Commit and signal controller.
//!
//! # Responsibilities
//! - Turn a desired state into a committed, validated, running configuration
//! - Never leave the proxy with an invalid configuration
//! - Avoid reloads when nothing changed
//!
//! # Cycle
//! ```text
//! size → render → validate → decide → persist → signal
//!                    │          │
//!                    │          └─ equal: stop (no write, no signal),
//!                    │             unless the last signal failed
//!                    └─ invalid: stop, committed file untouched
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::Instrument;

use crate::capacity::HashSizing;
use crate::config::ControllerConfig;
use crate::error::SyncError;
use crate::model::{CustomConfig, DesiredState};
use crate::observability::metrics;
use crate::process::ProcessControl;
use crate::sync::commit;
use crate::sync::decision::{ConfigDiff, DecisionEngine};
use crate::sync::validator::{ValidationResult, Validator};
use crate::system::read_somaxconn;
use crate::template::{EffectiveOptions, TemplateStore};

/// Settings for one controller instance.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Path the proxy reads at start and on reload.
    pub config_path: PathBuf,
    pub healthz_uri: String,
    pub somaxconn_path: PathBuf,
    pub diff_program: PathBuf,
    pub keep_rejected: bool,
    /// Directory for validation artifacts; the system temp dir when unset.
    pub validation_dir: Option<PathBuf>,
    /// Options every state starts from before its own options bag applies.
    pub base: CustomConfig,
}

impl SyncSettings {
    /// Defaults for committing to `config_path`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            healthz_uri: "/healthz".to_string(),
            somaxconn_path: PathBuf::from("/proc/sys/net/core/somaxconn"),
            diff_program: PathBuf::from("diff"),
            keep_rejected: false,
            validation_dir: None,
            base: CustomConfig::default(),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        let base = CustomConfig {
            server_name_hash_bucket_size: config.sync.server_name_hash_bucket_size,
            server_name_hash_max_size: config.sync.server_name_hash_max_size,
            ..CustomConfig::default()
        };

        Self {
            config_path: PathBuf::from(&config.process.config_path),
            healthz_uri: config.sync.healthz_uri.clone(),
            somaxconn_path: PathBuf::from(&config.sync.somaxconn_path),
            diff_program: PathBuf::from(&config.sync.diff_program),
            keep_rejected: config.sync.keep_rejected,
            validation_dir: None,
            base,
        }
    }
}

/// What a successful cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Candidate matched the committed configuration; nothing written.
    Unchanged { config: Vec<u8> },
    /// Candidate was committed and the proxy signalled.
    Reloaded { config: Vec<u8>, signal_output: String },
}

impl SyncOutcome {
    /// The configuration now committed.
    pub fn config(&self) -> &[u8] {
        match self {
            SyncOutcome::Unchanged { config } | SyncOutcome::Reloaded { config, .. } => config,
        }
    }

    pub fn reloaded(&self) -> bool {
        matches!(self, SyncOutcome::Reloaded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Unchanged { .. } => "unchanged",
            SyncOutcome::Reloaded { .. } => "reloaded",
        }
    }
}

/// Drives render → validate → commit → signal.
///
/// Cycles must not overlap; the reconciler runs them one at a time.
pub struct SyncController {
    control: Arc<dyn ProcessControl>,
    templates: Arc<TemplateStore>,
    validator: Validator,
    decisions: DecisionEngine,
    settings: SyncSettings,
    /// Largest hash sizing committed so far.
    sizing_floor: Mutex<HashSizing>,
    /// A committed file has not been acknowledged by a reload yet.
    signal_pending: AtomicBool,
}

impl SyncController {
    pub fn new(
        control: Arc<dyn ProcessControl>,
        templates: Arc<TemplateStore>,
        settings: SyncSettings,
    ) -> Self {
        let mut validator = Validator::new(control.clone()).keep_rejected(settings.keep_rejected);
        if let Some(dir) = &settings.validation_dir {
            validator = validator.with_temp_dir(dir);
        }

        Self {
            decisions: DecisionEngine::new(ConfigDiff::new(&settings.diff_program)),
            control,
            templates,
            validator,
            settings,
            sizing_floor: Mutex::new(HashSizing::default()),
            signal_pending: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    /// Bring the committed configuration in line with `state`.
    pub async fn synchronize(&self, state: &DesiredState) -> Result<SyncOutcome, SyncError> {
        let started = Instant::now();
        let span = tracing::info_span!("sync", cycle = %uuid::Uuid::new_v4());

        let result = self.run_cycle(state).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(outcome) => {
                metrics::record_sync(outcome.label(), started);
                tracing::debug!(
                    outcome = outcome.label(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sync cycle finished"
                );
            }
            Err(e) => {
                metrics::record_sync(e.kind(), started);
                tracing::error!(kind = e.kind(), "Sync cycle failed: {}", e);
            }
        }
        result
    }

    async fn run_cycle(&self, state: &DesiredState) -> Result<SyncOutcome, SyncError> {
        let (candidate, options) = self.prepare(state).await?;

        let current = commit::read_committed(&self.settings.config_path).await;
        let decision = self.decisions.decide(current, &candidate).await;
        if decision.is_required() {
            commit::write_committed(&self.settings.config_path, &candidate)
                .await
                .map_err(|e| SyncError::environment("writing committed configuration", e))?;
            self.raise_floor(options.sizing());
            self.signal_pending.store(true, Ordering::SeqCst);
            tracing::info!(
                path = %self.settings.config_path.display(),
                reason = ?decision,
                "Committed new configuration"
            );
        } else if self.signal_pending.load(Ordering::SeqCst) {
            tracing::info!("Committed configuration was never applied, signalling again");
        } else {
            tracing::debug!("Reload not required");
            return Ok(SyncOutcome::Unchanged { config: candidate });
        }

        let signal_output = self.signal().await?;
        Ok(SyncOutcome::Reloaded {
            config: candidate,
            signal_output,
        })
    }

    /// Ask the proxy to pick up the committed file.
    ///
    /// The pending flag is cleared only on success, so a failed signal is
    /// repeated by the next cycle even when the candidate is unchanged.
    async fn signal(&self) -> Result<String, SyncError> {
        let output = self.control.reload().await.map_err(|e| {
            metrics::record_reload(false);
            SyncError::ReloadSignal {
                reason: e.to_string(),
            }
        })?;
        if !output.success {
            metrics::record_reload(false);
            return Err(SyncError::ReloadSignal {
                reason: format!("{}: {}", output.exit_description(), output.output.trim()),
            });
        }

        self.signal_pending.store(false, Ordering::SeqCst);
        metrics::record_reload(true);
        tracing::info!("Proxy reloaded");
        Ok(output.output)
    }

    /// Commit a validated candidate without signalling the proxy.
    ///
    /// Used once at startup, before any proxy process exists to reload.
    pub async fn seed(&self, state: &DesiredState) -> Result<(), SyncError> {
        let (candidate, options) = self.prepare(state).await?;
        commit::write_committed(&self.settings.config_path, &candidate)
            .await
            .map_err(|e| SyncError::environment("writing committed configuration", e))?;
        self.raise_floor(options.sizing());
        Ok(())
    }

    /// Size, render and validate a candidate for `state`.
    async fn prepare(&self, state: &DesiredState) -> Result<(Vec<u8>, EffectiveOptions), SyncError> {
        let floor = self.sizing_floor();
        let backlog = read_somaxconn(&self.settings.somaxconn_path);
        let options = EffectiveOptions::build(
            state,
            &self.settings.base,
            backlog,
            &self.settings.healthz_uri,
            floor,
        );

        let renderer = self.templates.current();
        let candidate = renderer.render(state, &options)?;
        tracing::debug!(
            bytes = candidate.len(),
            servers = state.servers.len(),
            template_generation = self.templates.generation(),
            "Rendered candidate configuration"
        );

        match self.validator.validate(&candidate).await? {
            ValidationResult::Valid => Ok((candidate, options)),
            ValidationResult::Invalid {
                diagnostics,
                retained,
            } => {
                metrics::record_validation_failure();
                if let Some(path) = retained {
                    tracing::info!(path = %path.display(), "Rejected candidate kept for inspection");
                }
                Err(SyncError::Validation {
                    checker: self.control.name(),
                    diagnostics,
                })
            }
        }
    }

    fn raise_floor(&self, committed: HashSizing) {
        let mut floor = self
            .sizing_floor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *floor = committed.raise_floor(*floor);
    }

    /// Largest hash sizing committed so far.
    pub fn sizing_floor(&self) -> HashSizing {
        *self
            .sizing_floor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
