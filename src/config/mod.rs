//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, NGINX_BINARY override)
//!     → validation.rs (semantic checks)
//!     → ControllerConfig (validated, immutable)
//!     → CLI flags applied last by the binary
//!
//! File watching:
//!     watcher.rs reports changes to one file
//!     → template store reloads the template
//!     → reconciler reloads the desired state
//! ```
//!
//! # Design Decisions
//! - Controller settings are read once at startup; only the template and
//!   the desired state are hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AdminConfig, ControllerConfig, LogFormat, ObservabilityConfig, ProcessConfig, RetryConfig,
    StateConfig, SyncConfig, TemplateConfig,
};
pub use watcher::FileWatcher;
