//! nginx binary invocation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::process::control::{CommandOutput, ExitReport, ProcessControl, ProcessHandle};

/// Drives a real nginx binary.
#[derive(Debug, Clone)]
pub struct NginxProcess {
    binary: PathBuf,
    /// Path the running master was started with; used to locate it on reload.
    config_path: PathBuf,
}

impl NginxProcess {
    pub fn new(binary: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_path: config_path.into(),
        }
    }

    async fn output(&self, args: &[&OsStr]) -> std::io::Result<CommandOutput> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok(CommandOutput::from_output(&output))
    }
}

#[async_trait::async_trait]
impl ProcessControl for NginxProcess {
    async fn check(&self, path: &Path) -> std::io::Result<CommandOutput> {
        self.output(&[OsStr::new("-t"), OsStr::new("-c"), path.as_os_str()])
            .await
    }

    async fn reload(&self) -> std::io::Result<CommandOutput> {
        self.output(&[
            OsStr::new("-c"),
            self.config_path.as_os_str(),
            OsStr::new("-s"),
            OsStr::new("reload"),
        ])
        .await
    }

    async fn run(&self, path: &Path) -> std::io::Result<ProcessHandle> {
        let mut child = Command::new(&self.binary)
            .arg("-c")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let (handle, exit_tx) = ProcessHandle::pair(child.id());
        tokio::spawn(async move {
            let report = match child.wait().await {
                Ok(status) => ExitReport {
                    success: status.success(),
                    code: status.code(),
                    error: None,
                },
                Err(e) => ExitReport {
                    success: false,
                    code: None,
                    error: Some(e.to_string()),
                },
            };
            let _ = exit_tx.send(report);
        });

        Ok(handle)
    }

    fn name(&self) -> String {
        self.binary.display().to_string()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_passes_arguments_and_captures_output() {
        let nginx = NginxProcess::new("echo", "/etc/nginx/nginx.conf");
        let out = nginx.check(Path::new("/tmp/candidate.conf")).await.unwrap();

        assert!(out.success);
        assert_eq!(out.code, Some(0));
        assert_eq!(out.output.trim(), "-t -c /tmp/candidate.conf");
    }

    #[tokio::test]
    async fn reload_targets_committed_path() {
        let nginx = NginxProcess::new("echo", "/etc/nginx/nginx.conf");
        let out = nginx.reload().await.unwrap();
        assert_eq!(out.output.trim(), "-c /etc/nginx/nginx.conf -s reload");
    }

    #[tokio::test]
    async fn reload_reports_failure_status() {
        let nginx = NginxProcess::new("false", "/etc/nginx/nginx.conf");
        let out = nginx.reload().await.unwrap();

        assert!(!out.success);
        assert_eq!(out.code, Some(1));
    }

    #[tokio::test]
    async fn run_reports_exit() {
        let nginx = NginxProcess::new("true", "/etc/nginx/nginx.conf");
        let handle = nginx.run(Path::new("/tmp/nginx.conf")).await.unwrap();
        assert!(handle.pid.is_some());

        let report = handle.exit.await.unwrap();
        assert!(report.success);
        assert_eq!(report.code, Some(0));
    }

    #[tokio::test]
    async fn missing_binary_is_an_io_error() {
        let nginx = NginxProcess::new("/nonexistent/sbin/nginx", "/etc/nginx/nginx.conf");
        assert!(nginx.check(Path::new("/tmp/x")).await.is_err());
        assert!(nginx.run(Path::new("/tmp/x")).await.is_err());
    }
}
