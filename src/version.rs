//! Build metadata, exposed read-only for diagnostics.

use serde::Serialize;

/// Identifies the managed backend and this controller build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub name: &'static str,
    pub release: &'static str,
    pub build: &'static str,
    pub repository: &'static str,
}

/// Release, commit and repository are injected at build time when available.
pub fn info() -> BackendInfo {
    BackendInfo {
        name: "NGINX",
        release: env!("CARGO_PKG_VERSION"),
        build: option_env!("BUILD_COMMIT").unwrap_or("git-unknown"),
        repository: option_env!("BUILD_REPOSITORY").unwrap_or("unknown"),
    }
}
