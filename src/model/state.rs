//! Desired state definitions.
//!
//! This module defines the routing rules, backends and defaults the proxy
//! should serve. All types derive Serde traits so a state snapshot can be
//! read from disk or handed over by a control-plane watcher.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Complete desired state for one synchronisation cycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DesiredState {
    /// Virtual servers, rendered in this order.
    pub servers: Vec<Server>,

    /// HTTP upstreams referenced by server locations.
    pub backends: Vec<Backend>,

    /// Raw TCP services exposed on dedicated ports.
    pub tcp_backends: Vec<L4Backend>,

    /// Raw UDP services exposed on dedicated ports.
    pub udp_backends: Vec<L4Backend>,

    /// Hostnames whose TLS traffic is forwarded without termination.
    pub passthrough_backends: Vec<PassthroughBackend>,

    /// Key/value options controlling template behaviour.
    pub options: BTreeMap<String, String>,
}

/// A virtual server identified by its hostname.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Server {
    pub hostname: String,

    /// Forward TLS to the backend instead of terminating it.
    pub ssl_passthrough: bool,

    pub tls: Option<TlsInfo>,

    pub locations: Vec<Location>,
}

impl Server {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }
}

/// Certificate material referenced by a server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TlsInfo {
    /// Path to the PEM file holding certificate and key.
    pub pem_path: String,

    /// Checksum of the PEM file; a change forces a new rendering.
    #[serde(default)]
    pub checksum: String,
}

/// A path under a server mapped to a backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Location {
    pub path: String,

    /// Name of the backend serving this location.
    pub backend: String,

    pub is_default_backend: bool,
}

/// An HTTP upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Backend {
    pub name: String,

    /// Talk TLS to the endpoints.
    pub secure: bool,

    pub endpoints: Vec<Endpoint>,
}

/// One address inside an upstream.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,

    #[serde(default)]
    pub max_fails: u32,

    /// Seconds the endpoint is considered unavailable after `max_fails`.
    #[serde(default)]
    pub fail_timeout: u32,
}

/// A TCP or UDP service listening on a dedicated port.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct L4Backend {
    pub port: u16,
    pub backend: String,
    pub endpoints: Vec<Endpoint>,
}

/// TLS passthrough target selected by SNI hostname.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PassthroughBackend {
    pub hostname: String,
    pub backend: String,
    pub port: u16,
}

/// Error type for desired state loading.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read desired state: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse desired state: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load a desired state snapshot from a JSON file.
pub fn load_state(path: &Path) -> Result<DesiredState, StateError> {
    let content = fs::read_to_string(path)?;
    let state = serde_json::from_str(&content)?;
    Ok(state)
}
