//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ControllerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding the proxy binary path.
pub const BINARY_ENV: &str = "NGINX_BINARY";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides on top of file-based settings.
pub fn apply_env_overrides(config: &mut ControllerConfig) {
    apply_binary_override(config, std::env::var(BINARY_ENV).ok());
}

fn apply_binary_override(config: &mut ControllerConfig, value: Option<String>) {
    if let Some(binary) = value.filter(|v| !v.trim().is_empty()) {
        tracing::debug!(binary = %binary, "Using proxy binary from {}", BINARY_ENV);
        config.process.binary = binary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [process]
            config_path = "/tmp/nginx.conf"

            [state]
            resync_interval_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.process.config_path, "/tmp/nginx.conf");
        assert_eq!(config.process.binary, "/usr/sbin/nginx");
        assert_eq!(config.state.resync_interval_secs, 5);
        assert_eq!(config.sync.healthz_uri, "/healthz");
    }

    #[test]
    fn semantic_errors_are_reported() {
        let err = parse_config("[state]\nresync_interval_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(err_text(&errors).contains("state.resync_interval_secs"));
            }
            other => panic!("expected validation error, got {}", other),
        }
    }

    fn err_text(errors: &[ValidationError]) -> String {
        join_errors(errors)
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(parse_config("[process"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn binary_override_ignores_blank_values() {
        let mut config = ControllerConfig::default();
        apply_binary_override(&mut config, Some("  ".into()));
        assert_eq!(config.process.binary, "/usr/sbin/nginx");

        apply_binary_override(&mut config, Some("/opt/nginx/sbin/nginx".into()));
        assert_eq!(config.process.binary, "/opt/nginx/sbin/nginx");
    }
}
