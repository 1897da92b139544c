//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ingress_reloader::model::{Backend, DesiredState, Endpoint, Location, Server};
use ingress_reloader::process::{CommandOutput, ProcessControl, ProcessHandle};
use ingress_reloader::sync::{SyncController, SyncSettings};
use ingress_reloader::template::TemplateStore;
use tempfile::TempDir;

/// Stand-in for the proxy binary that records every invocation.
#[derive(Default)]
pub struct FakeProcess {
    pub checks: AtomicUsize,
    pub reloads: AtomicUsize,
    reject: AtomicBool,
    fail_reload: AtomicBool,
    reject_marker: Mutex<Option<String>>,
    last_checked: Mutex<Option<Vec<u8>>>,
}

impl FakeProcess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every configuration check fail.
    pub fn reject_configs(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Reject only configurations containing `marker`.
    pub fn reject_configs_containing(&self, marker: &str) {
        *self.reject_marker.lock().unwrap() = Some(marker.to_string());
    }

    /// Make every reload signal fail.
    pub fn fail_reloads(&self, fail: bool) {
        self.fail_reload.store(fail, Ordering::SeqCst);
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Bytes seen by the most recent check.
    pub fn last_checked(&self) -> Option<Vec<u8>> {
        self.last_checked.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProcessControl for FakeProcess {
    async fn check(&self, path: &Path) -> std::io::Result<CommandOutput> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let content = std::fs::read(path)?;
        let marked = match self.reject_marker.lock().unwrap().as_deref() {
            Some(marker) => String::from_utf8_lossy(&content).contains(marker),
            None => false,
        };
        *self.last_checked.lock().unwrap() = Some(content);

        if marked || self.reject.load(Ordering::SeqCst) {
            return Ok(CommandOutput::failure(
                1,
                format!(
                    "nginx: [emerg] unknown directive \"bogus\" in {}:3\n\
                     nginx: configuration file {} test failed\n",
                    path.display(),
                    path.display()
                ),
            ));
        }
        Ok(CommandOutput::success(format!(
            "nginx: configuration file {} test is successful\n",
            path.display()
        )))
    }

    async fn reload(&self) -> std::io::Result<CommandOutput> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reload.load(Ordering::SeqCst) {
            return Ok(CommandOutput::failure(
                1,
                "nginx: [error] open() \"/run/nginx.pid\" failed (2: No such file or directory)\n",
            ));
        }
        Ok(CommandOutput::success(""))
    }

    async fn run(&self, _path: &Path) -> std::io::Result<ProcessHandle> {
        let (handle, _exit) = ProcessHandle::pair(Some(4242));
        Ok(handle)
    }

    fn name(&self) -> String {
        "fake-nginx".to_string()
    }
}

/// The template shipped with the crate.
pub fn bundled_template() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/nginx.tmpl")
}

/// Everything a sync test needs, rooted in one temporary directory.
pub struct Harness {
    pub dir: TempDir,
    pub fake: Arc<FakeProcess>,
    pub templates: Arc<TemplateStore>,
    pub controller: SyncController,
}

impl Harness {
    /// Controller using the bundled template.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("nginx.tmpl");
        std::fs::copy(bundled_template(), &template).unwrap();
        Self::with_template(dir, &template)
    }

    pub fn with_template(dir: TempDir, template: &Path) -> Self {
        let fake = FakeProcess::new();
        let templates = Arc::new(TemplateStore::load(template).unwrap());

        let validation_dir = dir.path().join("validation");
        std::fs::create_dir_all(&validation_dir).unwrap();

        let mut settings = SyncSettings::new(dir.path().join("nginx.conf"));
        settings.somaxconn_path = dir.path().join("somaxconn");
        settings.validation_dir = Some(validation_dir);

        let controller = SyncController::new(fake.clone(), templates.clone(), settings);
        Self {
            dir,
            fake,
            templates,
            controller,
        }
    }

    pub fn committed_path(&self) -> PathBuf {
        self.dir.path().join("nginx.conf")
    }

    pub fn committed(&self) -> Option<Vec<u8>> {
        std::fs::read(self.committed_path()).ok()
    }

    /// Validation artifacts still on disk.
    pub fn leftover_artifacts(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("validation"))
            .unwrap()
            .count()
    }
}

/// One server `host` with `/` routed to a single-endpoint backend.
pub fn single_server_state(host: &str, upstream: &str) -> DesiredState {
    let mut server = Server::new(host);
    server.locations.push(Location {
        path: "/".into(),
        backend: upstream.into(),
        is_default_backend: false,
    });

    DesiredState {
        servers: vec![server],
        backends: vec![Backend {
            name: upstream.into(),
            secure: false,
            endpoints: vec![Endpoint {
                address: "10.0.0.4".into(),
                port: 8080,
                max_fails: 0,
                fail_timeout: 0,
            }],
        }],
        ..DesiredState::default()
    }
}
