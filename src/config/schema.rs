//! Configuration schema definitions.
//!
//! This module defines the controller's own settings: where the proxy
//! binary and its files live, how often to resynchronise, and how to
//! report. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

/// Root configuration for the controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Managed proxy process.
    pub process: ProcessConfig,

    /// Template source.
    pub template: TemplateConfig,

    /// Desired state source.
    pub state: StateConfig,

    /// Synchronisation behaviour.
    pub sync: SyncConfig,

    /// Backoff for failed cycles.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Managed process configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Path to the proxy binary.
    pub binary: String,

    /// Committed configuration path read at start and on reload.
    pub config_path: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            binary: "/usr/sbin/nginx".to_string(),
            config_path: "/etc/nginx/nginx.conf".to_string(),
        }
    }
}

/// Template configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TemplateConfig {
    /// Path to the template file.
    pub path: String,

    /// Reload the template when the file changes.
    pub watch: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: "/etc/nginx/template/nginx.tmpl".to_string(),
            watch: true,
        }
    }
}

/// Desired state source configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StateConfig {
    /// JSON snapshot of the desired state.
    pub path: String,

    /// Watch the snapshot for changes.
    pub watch: bool,

    /// Periodic resynchronisation interval in seconds.
    pub resync_interval_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: "/etc/ingress-reloader/state.json".to_string(),
            watch: true,
            resync_interval_secs: 30,
        }
    }
}

/// Synchronisation settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Path answered by the proxy's health endpoint.
    pub healthz_uri: String,

    /// Source of the kernel socket backlog limit.
    pub somaxconn_path: String,

    /// Program used to log configuration diffs at debug level.
    pub diff_program: String,

    /// Keep rejected candidates on disk for inspection.
    pub keep_rejected: bool,

    /// Base floor for the server-name hash bucket size.
    pub server_name_hash_bucket_size: usize,

    /// Base floor for the server-name hash max size.
    pub server_name_hash_max_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            healthz_uri: "/healthz".to_string(),
            somaxconn_path: "/proc/sys/net/core/somaxconn".to_string(),
            diff_program: "diff".to_string(),
            keep_rejected: false,
            server_name_hash_bucket_size: 64,
            server_name_hash_max_size: 512,
        }
    }
}

/// Retry configuration for failed cycles.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:10254".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// Bearer token required on admin routes when set.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:10255".to_string(),
            api_key: None,
        }
    }
}
