//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, sizes > 0)
//! - Check addresses and paths are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControllerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ControllerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &ControllerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.process.binary.trim().is_empty() {
        errors.push(ValidationError::new("process.binary", "must not be empty"));
    }

    let committed = Path::new(&config.process.config_path);
    if config.process.config_path.trim().is_empty() {
        errors.push(ValidationError::new("process.config_path", "must not be empty"));
    } else if committed.file_name().is_none() {
        errors.push(ValidationError::new(
            "process.config_path",
            "must name a file, not a directory",
        ));
    }

    if config.template.path.trim().is_empty() {
        errors.push(ValidationError::new("template.path", "must not be empty"));
    }

    if config.state.path.trim().is_empty() {
        errors.push(ValidationError::new("state.path", "must not be empty"));
    }

    if config.state.resync_interval_secs == 0 {
        errors.push(ValidationError::new(
            "state.resync_interval_secs",
            "must be greater than zero",
        ));
    }

    if !config.sync.healthz_uri.starts_with('/') {
        errors.push(ValidationError::new(
            "sync.healthz_uri",
            format!("must be an absolute path, got {:?}", config.sync.healthz_uri),
        ));
    }

    if config.sync.server_name_hash_bucket_size == 0 {
        errors.push(ValidationError::new(
            "sync.server_name_hash_bucket_size",
            "must be greater than zero",
        ));
    }

    if config.sync.server_name_hash_max_size == 0 {
        errors.push(ValidationError::new(
            "sync.server_name_hash_max_size",
            "must be greater than zero",
        ));
    }

    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::new(
            "retry.base_delay_ms",
            "must not exceed retry.max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "admin.bind_address",
            format!("invalid socket address {:?}", config.admin.bind_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
