//! Capability interface over the managed process.

use std::path::Path;

use tokio::sync::oneshot;

/// Operations the controller needs from the proxy binary.
#[async_trait::async_trait]
pub trait ProcessControl: Send + Sync {
    /// Check the syntax of the configuration at `path` without applying it.
    async fn check(&self, path: &Path) -> std::io::Result<CommandOutput>;

    /// Ask the running instance to reload its configuration in place.
    async fn reload(&self) -> std::io::Result<CommandOutput>;

    /// Start the proxy in the foreground using the configuration at `path`.
    async fn run(&self, path: &Path) -> std::io::Result<ProcessHandle>;

    /// Human-readable name used in diagnostics.
    fn name(&self) -> String;
}

/// Result of a short-lived invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

impl CommandOutput {
    pub fn from_output(output: &std::process::Output) -> Self {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Self {
            success: output.status.success(),
            code: output.status.code(),
            output: combined,
        }
    }

    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            output: output.into(),
        }
    }

    /// Describe the exit for error messages.
    pub fn exit_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// How a long-running process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    pub code: Option<i32>,
    /// Set when waiting on the process itself failed.
    pub error: Option<String>,
}

/// Handle to a started process.
pub struct ProcessHandle {
    pub pid: Option<u32>,
    /// Resolves once the process has exited.
    pub exit: oneshot::Receiver<ExitReport>,
}

impl ProcessHandle {
    /// Build a handle plus the sender that reports its exit.
    pub fn pair(pid: Option<u32>) -> (Self, oneshot::Sender<ExitReport>) {
        let (tx, rx) = oneshot::channel();
        (Self { pid, exit: rx }, tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_description_covers_signals() {
        assert_eq!(CommandOutput::failure(1, "").exit_description(), "exit status 1");
        let killed = CommandOutput {
            success: false,
            code: None,
            output: String::new(),
        };
        assert_eq!(killed.exit_description(), "terminated by signal");
    }
}
