//! Reload decision.
//!
//! # Responsibilities
//! - Decide whether a candidate differs from the committed configuration
//! - Report a textual diff for observability
//!
//! # Design Decisions
//! - The decision is byte-exact equality; the diff never influences it
//! - Availability over economy: an unreadable committed file or a failed
//!   diff both mean "reload", since under-reloading is the worse failure
//! - The external diff only runs when debug logging is enabled

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

/// True when `candidate` differs from `current` in any byte.
pub fn needs_reload(current: &[u8], candidate: &[u8]) -> bool {
    current != candidate
}

/// Textual comparison result, for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResult {
    Equal,
    Different { detail: String },
    Unknown { reason: String },
}

impl DiffResult {
    /// Conservative reading of a diff: anything but a clean `Equal` reloads.
    pub fn requires_reload(&self) -> bool {
        !matches!(self, DiffResult::Equal)
    }
}

/// Why a reload was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadReason {
    /// Nothing readable at the committed path (first run, file removed).
    Unreadable { reason: String },
    /// Committed and candidate bytes differ.
    Changed,
}

/// Result of comparing a candidate against the committed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadDecision {
    Skip,
    Reload(ReloadReason),
}

impl ReloadDecision {
    pub fn is_required(&self) -> bool {
        matches!(self, ReloadDecision::Reload(_))
    }
}

/// Compares configurations with an external `diff -u`.
#[derive(Debug, Clone)]
pub struct ConfigDiff {
    program: PathBuf,
}

impl Default for ConfigDiff {
    fn default() -> Self {
        Self::new("diff")
    }
}

impl ConfigDiff {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Produce a unified diff between the two configurations.
    pub async fn diff(&self, current: &[u8], candidate: &[u8]) -> DiffResult {
        let old = temp_copy("nginx-cfg-current", current);
        let new = temp_copy("nginx-cfg-diff", candidate);
        let (old, new) = match (old, new) {
            (Ok(old), Ok(new)) => (old, new),
            (Err(e), _) | (_, Err(e)) => {
                return DiffResult::Unknown {
                    reason: format!("error creating temporary file: {}", e),
                }
            }
        };

        let output = Command::new(&self.program)
            .arg("-u")
            .arg(old.path())
            .arg(new.path())
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) => match out.status.code() {
                Some(0) => DiffResult::Equal,
                Some(1) => DiffResult::Different {
                    detail: String::from_utf8_lossy(&out.stdout).into_owned(),
                },
                _ => DiffResult::Unknown {
                    reason: format!(
                        "{} exited with {}: {}",
                        self.program.display(),
                        out.status,
                        String::from_utf8_lossy(&out.stderr).trim()
                    ),
                },
            },
            Err(e) => DiffResult::Unknown {
                reason: format!("failed to run {}: {}", self.program.display(), e),
            },
        }
    }
}

fn temp_copy(prefix: &str, content: &[u8]) -> io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix(prefix).tempfile()?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Applies the reload rule and logs diffs.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    diff: ConfigDiff,
}

impl DecisionEngine {
    pub fn new(diff: ConfigDiff) -> Self {
        Self { diff }
    }

    /// Decide whether `candidate` must replace the committed configuration.
    ///
    /// `current` is the result of reading the committed file; a read error
    /// is treated as "reload required".
    pub async fn decide(&self, current: io::Result<Vec<u8>>, candidate: &[u8]) -> ReloadDecision {
        let current = match current {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    tracing::info!("No committed configuration yet, reload required");
                } else {
                    tracing::warn!(error = %e, "Committed configuration unreadable, reload required");
                }
                return ReloadDecision::Reload(ReloadReason::Unreadable {
                    reason: e.to_string(),
                });
            }
        };

        if !needs_reload(&current, candidate) {
            return ReloadDecision::Skip;
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            match self.diff.diff(&current, candidate).await {
                DiffResult::Different { detail } => {
                    tracing::debug!("Configuration diff\n{}", detail)
                }
                DiffResult::Unknown { reason } => {
                    tracing::warn!(reason = %reason, "Error computing diff")
                }
                DiffResult::Equal => {
                    tracing::debug!("Diff reports no textual change, bytes differ")
                }
            }
        }

        ReloadDecision::Reload(ReloadReason::Changed)
    }
}
