//! Tera-backed configuration renderer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{describe_tera_error, RenderError, TemplateReloadError};
use crate::model::{Backend, DesiredState, L4Backend, PassthroughBackend, Server};
use crate::template::EffectiveOptions;

const TEMPLATE_NAME: &str = "nginx.tmpl";

/// Values exposed to the template.
#[derive(Serialize)]
struct RenderContext<'a> {
    servers: &'a [Server],
    backends: &'a [Backend],
    tcp_backends: &'a [L4Backend],
    udp_backends: &'a [L4Backend],
    passthrough_backends: &'a [PassthroughBackend],
    cfg: &'a crate::model::CustomConfig,
    backlog_size: u32,
    healthz_uri: &'a str,
    custom_errors: bool,
}

/// A compiled template, immutable once built.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
    source: Option<PathBuf>,
}

impl Renderer {
    /// Compile a template from its source text.
    pub fn from_source(source: &str) -> Result<Self, TemplateReloadError> {
        Self::compile(source, None)
    }

    /// Read and compile the template at `path`.
    pub fn from_path(path: &Path) -> Result<Self, TemplateReloadError> {
        let source = fs::read_to_string(path).map_err(|e| TemplateReloadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::compile(&source, Some(path.to_path_buf()))
    }

    fn compile(source: &str, path: Option<PathBuf>) -> Result<Self, TemplateReloadError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| TemplateReloadError::Parse {
                path: path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| TEMPLATE_NAME.to_string()),
                detail: describe_tera_error(&e),
            })?;

        Ok(Self { tera, source: path })
    }

    /// Where the template was loaded from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Render the configuration for `state`.
    pub fn render(
        &self,
        state: &DesiredState,
        options: &EffectiveOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let ctx = RenderContext {
            servers: &state.servers,
            backends: &state.backends,
            tcp_backends: &state.tcp_backends,
            udp_backends: &state.udp_backends,
            passthrough_backends: &state.passthrough_backends,
            cfg: &options.cfg,
            backlog_size: options.backlog_size,
            healthz_uri: &options.healthz_uri,
            custom_errors: options.custom_errors,
        };

        let context = Context::from_serialize(&ctx).map_err(|e| self.render_error(&e))?;
        let output = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| self.render_error(&e))?;

        Ok(output.into_bytes())
    }

    fn render_error(&self, err: &tera::Error) -> RenderError {
        RenderError {
            template: self
                .source
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| TEMPLATE_NAME.to_string()),
            message: describe_tera_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::HashSizing;
    use crate::model::{CustomConfig, Endpoint, Location};

    fn sample_state() -> DesiredState {
        DesiredState {
            servers: vec![Server {
                hostname: "x.com".into(),
                locations: vec![Location {
                    path: "/".into(),
                    backend: "web".into(),
                    is_default_backend: false,
                }],
                ..Server::default()
            }],
            backends: vec![Backend {
                name: "web".into(),
                secure: false,
                endpoints: vec![Endpoint {
                    address: "10.0.0.4".into(),
                    port: 8080,
                    max_fails: 0,
                    fail_timeout: 0,
                }],
            }],
            ..DesiredState::default()
        }
    }

    fn options_for(state: &DesiredState) -> EffectiveOptions {
        EffectiveOptions::build(
            state,
            &CustomConfig::default(),
            511,
            "/healthz",
            HashSizing::default(),
        )
    }

    #[test]
    fn renders_state_and_options() {
        let renderer = Renderer::from_source(
            "hash {{ cfg.server_name_hash_bucket_size }};\n\
             {% for s in servers %}server {{ s.hostname }};\n{% endfor %}\
             {% for b in backends %}{% for e in b.endpoints %}upstream {{ b.name }} {{ e.address }}:{{ e.port }};\n{% endfor %}{% endfor %}\
             backlog {{ backlog_size }};",
        )
        .unwrap();

        let state = sample_state();
        let out = String::from_utf8(renderer.render(&state, &options_for(&state)).unwrap()).unwrap();

        assert!(out.contains("hash 64;"));
        assert!(out.contains("server x.com;"));
        assert!(out.contains("upstream web 10.0.0.4:8080;"));
        assert!(out.contains("backlog 511;"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = Renderer::from_source("{% for s in servers %}{{ s.hostname }} {% endfor %}").unwrap();
        let state = sample_state();
        let opts = options_for(&state);
        assert_eq!(
            renderer.render(&state, &opts).unwrap(),
            renderer.render(&state, &opts).unwrap()
        );
    }

    #[test]
    fn malformed_template_is_rejected() {
        let err = Renderer::from_source("{% for s in servers %}").unwrap_err();
        assert!(matches!(err, TemplateReloadError::Parse { .. }));
    }

    #[test]
    fn missing_variable_is_a_render_error() {
        let renderer = Renderer::from_source("{{ nope.nothing }}").unwrap();
        let state = sample_state();
        assert!(renderer.render(&state, &options_for(&state)).is_err());
    }

    #[test]
    fn bundled_template_compiles_and_renders() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/nginx.tmpl");
        let renderer = Renderer::from_path(&path).unwrap();
        assert_eq!(renderer.source(), Some(path.as_path()));

        let mut state = sample_state();
        state.options.insert("custom-http-errors".into(), "404,503".into());
        let out = String::from_utf8(renderer.render(&state, &options_for(&state)).unwrap()).unwrap();

        assert!(out.contains("server_names_hash_bucket_size 64;"));
        assert!(out.contains("server_name x.com;"));
        assert!(out.contains("server 10.0.0.4:8080"));
        assert!(out.contains("location /healthz"));
        assert!(out.contains("error_page 404"));
    }
}
