//! File watcher for hot reload.
//!
//! Watches the parent directory, not the file: replacements by rename
//! (editors, config-map mounts) must still be reported.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that reports changes to a single file.
pub struct FileWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<PathBuf>,
}

impl FileWatcher {
    /// Create a new FileWatcher.
    ///
    /// Returns the watcher and a receiver for change notifications.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned handle must be kept alive for as long as notifications
    /// are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();
        let path = self.path.clone();
        let file_name = self.path.file_name().map(OsString::from);
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if touches_file(&event, file_name.as_deref()) {
                        let _ = tx.send(path.clone());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "File watcher started");
        Ok(watcher)
    }
}

fn touches_file(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    match file_name {
        Some(name) => event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name)),
        None => true,
    }
}
