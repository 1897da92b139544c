//! Error types shared across the synchronisation pipeline.
//!
//! # Design Decisions
//! - Each failure phase has its own variant so callers can tell an
//!   unhealthy environment apart from a rejected configuration
//! - Diagnostics from the proxy binary are carried verbatim; the checker,
//!   not this controller, knows why a configuration is wrong

use std::io;

const BANNER: &str =
    "-------------------------------------------------------------------------------";

/// Error produced by one synchronisation cycle.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Temp artifacts, the committed path or the process itself are unusable.
    #[error("environment error while {context}: {source}")]
    Environment {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// The template could not be rendered with the given state.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The proxy's own syntax check rejected the candidate configuration.
    #[error("\n{banner}\nError: configuration rejected by {checker}\n{diagnostics}\n{banner}", banner = BANNER)]
    Validation {
        checker: String,
        diagnostics: String,
    },

    /// The candidate was committed but the running process could not be signalled.
    #[error("reload signal failed: {reason}")]
    ReloadSignal { reason: String },
}

impl SyncError {
    pub(crate) fn environment(context: &'static str, source: io::Error) -> Self {
        SyncError::Environment { context, source }
    }

    /// Short label used for metrics and status reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Environment { .. } => "environment",
            SyncError::Render(_) => "render",
            SyncError::Validation { .. } => "invalid",
            SyncError::ReloadSignal { .. } => "reload_signal",
        }
    }
}

/// Failure to render a template against the desired state.
#[derive(Debug, thiserror::Error)]
#[error("failed to render template {template}: {message}")]
pub struct RenderError {
    pub template: String,
    pub message: String,
}

/// A replacement template could not be loaded; the previous one stays live.
#[derive(Debug, thiserror::Error)]
pub enum TemplateReloadError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("\n{banner}\nError loading template {path}:\n{detail}\n{banner}", banner = BANNER)]
    Parse { path: String, detail: String },
}

/// Render a tera error including its full cause chain.
///
/// Tera keeps the useful part of a parse failure (line, column, expected
/// token) in the source chain rather than the top-level message.
pub(crate) fn describe_tera_error(err: &tera::Error) -> String {
    use std::error::Error as _;

    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push('\n');
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
