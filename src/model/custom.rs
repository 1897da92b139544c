//! Typed view over the desired state's options bag.
//!
//! # Design Decisions
//! - Keys are kebab-case, matching the control plane's option names
//! - A malformed value keeps the current setting and logs a warning;
//!   one bad key never rejects the whole bag
//! - Unknown keys are ignored so newer control planes can add options

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

/// Options controlling template behaviour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomConfig {
    /// HTTP status codes intercepted and served by the default backend.
    pub custom_http_errors: Vec<u16>,

    /// Floor for `server_names_hash_bucket_size`.
    pub server_name_hash_bucket_size: usize,

    /// Floor for `server_names_hash_max_size`.
    pub server_name_hash_max_size: usize,

    /// Maximum client request body (nginx size syntax, e.g. "1m").
    pub body_size: String,

    /// Keep-alive timeout in seconds.
    pub keep_alive: u32,

    pub worker_processes: String,

    pub use_http2: bool,

    pub ssl_protocols: String,

    pub proxy_connect_timeout: u32,
    pub proxy_read_timeout: u32,
    pub proxy_send_timeout: u32,

    pub error_log_level: String,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            custom_http_errors: Vec::new(),
            server_name_hash_bucket_size: 64,
            server_name_hash_max_size: 512,
            body_size: "1m".to_string(),
            keep_alive: 75,
            worker_processes: "auto".to_string(),
            use_http2: true,
            ssl_protocols: "TLSv1.2 TLSv1.3".to_string(),
            proxy_connect_timeout: 5,
            proxy_read_timeout: 60,
            proxy_send_timeout: 60,
            error_log_level: "notice".to_string(),
        }
    }
}

impl CustomConfig {
    /// Build a configuration from defaults overlaid with the options bag.
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        let mut cfg = Self::default();
        cfg.apply_options(options);
        cfg
    }

    /// Overlay the options bag on top of the current values.
    pub fn apply_options(&mut self, options: &BTreeMap<String, String>) {
        for (key, value) in options {
            let value = value.trim();
            match key.as_str() {
                "custom-http-errors" => {
                    if let Some(codes) = parse_status_list(key, value) {
                        self.custom_http_errors = codes;
                    }
                }
                "server-name-hash-bucket-size" => {
                    set_parsed(&mut self.server_name_hash_bucket_size, key, value)
                }
                "server-name-hash-max-size" => {
                    set_parsed(&mut self.server_name_hash_max_size, key, value)
                }
                "body-size" => self.body_size = value.to_string(),
                "keep-alive" => set_parsed(&mut self.keep_alive, key, value),
                "worker-processes" => self.worker_processes = value.to_string(),
                "use-http2" => set_parsed(&mut self.use_http2, key, value),
                "ssl-protocols" => self.ssl_protocols = value.to_string(),
                "proxy-connect-timeout" => set_parsed(&mut self.proxy_connect_timeout, key, value),
                "proxy-read-timeout" => set_parsed(&mut self.proxy_read_timeout, key, value),
                "proxy-send-timeout" => set_parsed(&mut self.proxy_send_timeout, key, value),
                "error-log-level" => self.error_log_level = value.to_string(),
                _ => tracing::debug!(option = %key, "Ignoring unknown option"),
            }
        }
    }

    /// Custom error pages are rendered only when at least one code is configured.
    pub fn custom_errors_enabled(&self) -> bool {
        !self.custom_http_errors.is_empty()
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(option = %key, value = %value, "Invalid option value, keeping default"),
    }
}

fn parse_status_list(key: &str, value: &str) -> Option<Vec<u16>> {
    let mut codes = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => codes.push(code),
            _ => {
                tracing::warn!(option = %key, value = %item, "Invalid HTTP status code, ignoring option");
                return None;
            }
        }
    }
    Some(codes)
}
