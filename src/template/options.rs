//! Per-cycle template options.

use serde::Serialize;

use crate::capacity::{compute_sizing, HashSizing};
use crate::model::{CustomConfig, DesiredState};

/// Options handed to the renderer for one cycle.
///
/// `cfg` holds the base options overlaid with the state's options bag, with
/// the hash sizing fields raised to fit the current hostname set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveOptions {
    pub cfg: CustomConfig,

    /// Kernel socket backlog limit (`net.core.somaxconn`).
    pub backlog_size: u32,

    /// Path answered by the proxy's own health endpoint.
    pub healthz_uri: String,

    /// Render custom error handling.
    pub custom_errors: bool,
}

impl EffectiveOptions {
    /// Derive the options for `state`.
    ///
    /// `floor` is an additional lower bound on the hash sizing, typically the
    /// largest sizing committed by an earlier cycle.
    pub fn build(
        state: &DesiredState,
        base: &CustomConfig,
        backlog_size: u32,
        healthz_uri: &str,
        floor: HashSizing,
    ) -> Self {
        let base_sizing = HashSizing::new(
            base.server_name_hash_bucket_size,
            base.server_name_hash_max_size,
        );
        let mut cfg = base.clone();
        cfg.apply_options(&state.options);

        // The options bag may raise the base sizing, never lower it.
        let configured = HashSizing::new(
            cfg.server_name_hash_bucket_size,
            cfg.server_name_hash_max_size,
        )
        .raise_floor(base_sizing)
        .raise_floor(floor);
        let sizing = compute_sizing(&state.servers).raise_floor(configured);
        cfg.server_name_hash_bucket_size = sizing.bucket_size;
        cfg.server_name_hash_max_size = sizing.max_size;

        let custom_errors = cfg.custom_errors_enabled();
        Self {
            cfg,
            backlog_size,
            healthz_uri: healthz_uri.to_string(),
            custom_errors,
        }
    }

    pub fn sizing(&self) -> HashSizing {
        HashSizing::new(
            self.cfg.server_name_hash_bucket_size,
            self.cfg.server_name_hash_max_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Server;

    fn state_with_hosts(hosts: &[&str]) -> DesiredState {
        DesiredState {
            servers: hosts.iter().map(|h| Server::new(*h)).collect(),
            ..DesiredState::default()
        }
    }

    #[test]
    fn computed_sizing_raises_small_base() {
        let base = CustomConfig {
            server_name_hash_bucket_size: 16,
            server_name_hash_max_size: 16,
            ..CustomConfig::default()
        };
        let state = state_with_hosts(&["a.com", "averyveryverylonghostname.example.com"]);

        let opts = EffectiveOptions::build(&state, &base, 511, "/healthz", HashSizing::default());
        assert_eq!(opts.sizing(), HashSizing::new(64, 64));
        assert_eq!(opts.backlog_size, 511);
        assert_eq!(opts.healthz_uri, "/healthz");
    }

    #[test]
    fn base_floor_wins_over_smaller_computed_value() {
        let base = CustomConfig {
            server_name_hash_bucket_size: 64,
            server_name_hash_max_size: 1024,
            ..CustomConfig::default()
        };
        let state = state_with_hosts(&["x.com"]);

        let opts = EffectiveOptions::build(&state, &base, 128, "/healthz", HashSizing::default());
        assert_eq!(opts.sizing(), HashSizing::new(64, 1024));
    }

    #[test]
    fn options_bag_cannot_lower_base_floor() {
        let base = CustomConfig {
            server_name_hash_bucket_size: 256,
            server_name_hash_max_size: 4096,
            ..CustomConfig::default()
        };
        let mut state = state_with_hosts(&["x.com"]);
        state
            .options
            .insert("server-name-hash-bucket-size".into(), "32".into());
        state
            .options
            .insert("server-name-hash-max-size".into(), "64".into());

        let opts = EffectiveOptions::build(&state, &base, 128, "/healthz", HashSizing::default());
        assert_eq!(opts.sizing(), HashSizing::new(256, 4096));
        assert_eq!(opts.cfg.server_name_hash_bucket_size, 256);
    }

    #[test]
    fn previous_high_water_mark_is_kept() {
        let base = CustomConfig {
            server_name_hash_bucket_size: 1,
            server_name_hash_max_size: 1,
            ..CustomConfig::default()
        };
        let state = state_with_hosts(&["x.com"]);

        let opts = EffectiveOptions::build(&state, &base, 128, "/healthz", HashSizing::new(64, 256));
        assert_eq!(opts.sizing(), HashSizing::new(64, 256));
    }

    #[test]
    fn options_bag_overrides_base() {
        let mut state = state_with_hosts(&["x.com"]);
        state
            .options
            .insert("custom-http-errors".into(), "503".into());
        state
            .options
            .insert("server-name-hash-max-size".into(), "2048".into());

        let opts = EffectiveOptions::build(
            &state,
            &CustomConfig::default(),
            128,
            "/healthz",
            HashSizing::default(),
        );
        assert!(opts.custom_errors);
        assert_eq!(opts.cfg.server_name_hash_max_size, 2048);
    }
}
