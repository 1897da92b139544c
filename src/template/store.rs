//! Process-wide holder of the current renderer.
//!
//! # Responsibilities
//! - Fail fast when the initial template cannot be compiled
//! - Publish replacement renderers atomically
//! - Keep serving the previous renderer when a replacement is broken

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::error::TemplateReloadError;
use crate::observability::metrics;
use crate::template::Renderer;

/// Shared, swappable renderer slot.
pub struct TemplateStore {
    path: PathBuf,
    current: ArcSwap<Renderer>,
    generation: AtomicU64,
    /// Serialises replacements; readers never take it.
    reload_lock: Mutex<()>,
}

impl TemplateStore {
    /// Load the initial template. Any error here is fatal to the caller.
    pub fn load(path: &Path) -> Result<Self, TemplateReloadError> {
        let renderer = Renderer::from_path(path)?;
        tracing::info!(path = %path.display(), "Template loaded");
        Ok(Self::with_renderer(path, renderer))
    }

    /// Build a store around an already compiled renderer.
    pub fn with_renderer(path: &Path, renderer: Renderer) -> Self {
        Self {
            path: path.to_path_buf(),
            current: ArcSwap::from_pointee(renderer),
            generation: AtomicU64::new(1),
            reload_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the renderer currently in use.
    pub fn current(&self) -> Arc<Renderer> {
        self.current.load_full()
    }

    /// Identifier of the published renderer; bumped on every successful reload.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recompile the template from disk and publish it.
    ///
    /// On failure the previously published renderer stays in place.
    pub fn reload(&self) -> Result<u64, TemplateReloadError> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match Renderer::from_path(&self.path) {
            Ok(renderer) => {
                self.current.store(Arc::new(renderer));
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                metrics::record_template_reload(true);
                tracing::info!(path = %self.path.display(), generation, "New template loaded");
                Ok(generation)
            }
            Err(e) => {
                metrics::record_template_reload(false);
                Err(e)
            }
        }
    }
}

/// Reload the template each time the watcher reports a change.
///
/// Runs until the watcher channel closes or shutdown is signalled.
pub async fn run_reload_loop(
    store: Arc<TemplateStore>,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            change = changes.recv() => {
                let Some(path) = change else { break };
                tracing::debug!(path = %path.display(), "Template change detected");
                if let Err(e) = store.reload() {
                    // Template evolution is frozen until the file is fixed.
                    tracing::error!(
                        generation = store.generation(),
                        "{}\nKeeping the previous template.",
                        e
                    );
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Template reload loop received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
