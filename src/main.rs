//! ingress-reloader
//!
//! Keeps an nginx instance running a configuration rendered from the
//! desired routing state, validating every candidate before it is
//! committed and reloading only when the bytes change.
//!
//! # Architecture Overview
//!
//! ```text
//!   state.json ──watch──┐                       ┌───────────────┐
//!   SIGHUP ─────────────┼─▶ reconciler ─────────▶ SyncController │
//!   POST /admin/sync ───┤   (one cycle at a     │ size → render │
//!   periodic tick ──────┘    time, backoff)     │ validate      │
//!                                               │ decide        │
//!   nginx.tmpl ──watch──▶ TemplateStore ───────▶│ persist       │
//!                         (swap on success)     │ signal        │
//!                                               └──────┬────────┘
//!                                                      │ -s reload
//!                                                      ▼
//!                                               nginx (supervised)
//! ```

use std::path::PathBuf;

use clap::Parser;

use ingress_reloader::config::{self, ConfigError, ControllerConfig, LogFormat};
use ingress_reloader::config::validation::validate_config;
use ingress_reloader::lifecycle;
use ingress_reloader::observability::logging;

#[derive(Parser)]
#[command(name = "ingress-reloader")]
#[command(about = "Render, validate and hot-reload nginx configuration", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy binary (overrides NGINX_BINARY)
    #[arg(long)]
    nginx_binary: Option<String>,

    /// Committed configuration path
    #[arg(long)]
    nginx_config: Option<String>,

    /// Template path
    #[arg(long)]
    template: Option<String>,

    /// Desired state file
    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, value_enum)]
    log_format: Option<Format>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Pretty,
    Json,
}

impl Cli {
    fn apply(self, config: &mut ControllerConfig) {
        if let Some(binary) = self.nginx_binary {
            config.process.binary = binary;
        }
        if let Some(path) = self.nginx_config {
            config.process.config_path = path;
        }
        if let Some(path) = self.template {
            config.template.path = path;
        }
        if let Some(path) = self.state {
            config.state.path = path;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = match format {
                Format::Pretty => LogFormat::Pretty,
                Format::Json => LogFormat::Json,
            };
        }
    }
}

fn load(cli: Cli) -> Result<ControllerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ControllerConfig::default(),
    };
    config::apply_env_overrides(&mut config);
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ingress-reloader: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(
        &config.observability.log_level,
        config.observability.log_format,
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        binary = %config.process.binary,
        config_path = %config.process.config_path,
        template = %config.template.path,
        state = %config.state.path,
        "ingress-reloader starting"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
