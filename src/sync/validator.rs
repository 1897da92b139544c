//! Out-of-band configuration validation.
//!
//! # Responsibilities
//! - Write the candidate to a uniquely named temp file
//! - Run the proxy's own syntax check against it
//! - Report valid/invalid with the checker's raw output
//!
//! # Design Decisions
//! - Failing to create or write the temp file is an environment error,
//!   never reported as an invalid configuration
//! - The temp file is removed once the candidate passes; rejected
//!   candidates can optionally be kept for inspection

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::SyncError;
use crate::process::ProcessControl;

/// Outcome of a syntax check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid {
        /// Checker output, verbatim.
        diagnostics: String,
        /// Where the rejected candidate was kept, if retention is enabled.
        retained: Option<PathBuf>,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Validates candidate configurations with the proxy's check mode.
pub struct Validator {
    control: Arc<dyn ProcessControl>,
    temp_dir: Option<PathBuf>,
    keep_rejected: bool,
}

impl Validator {
    pub fn new(control: Arc<dyn ProcessControl>) -> Self {
        Self {
            control,
            temp_dir: None,
            keep_rejected: false,
        }
    }

    /// Create candidate files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Keep rejected candidates on disk.
    pub fn keep_rejected(mut self, keep: bool) -> Self {
        self.keep_rejected = keep;
        self
    }

    /// Check `candidate` without touching the committed configuration.
    pub async fn validate(&self, candidate: &[u8]) -> Result<ValidationResult, SyncError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("nginx-cfg").suffix(".conf");
        let created = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file =
            created.map_err(|e| SyncError::environment("creating validation artifact", e))?;

        file.write_all(candidate)
            .and_then(|_| file.flush())
            .map_err(|e| SyncError::environment("writing validation artifact", e))?;

        let output = self
            .control
            .check(file.path())
            .await
            .map_err(|e| SyncError::environment("running configuration check", e))?;

        if output.success {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove validation artifact");
            }
            return Ok(ValidationResult::Valid);
        }

        tracing::debug!(
            path = %file.path().display(),
            status = %output.exit_description(),
            "Candidate configuration rejected"
        );

        let retained = if self.keep_rejected {
            match file.keep() {
                Ok((_, path)) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to keep rejected candidate");
                    None
                }
            }
        } else {
            None
        };

        Ok(ValidationResult::Invalid {
            diagnostics: output.output,
            retained,
        })
    }
}
