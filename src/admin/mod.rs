//! Operator-facing HTTP API.
//!
//! ```text
//! GET  /healthz       liveness (proxy process running)
//! GET  /admin/status  last sync outcome + process state
//! GET  /admin/info    backend identity
//! POST /admin/sync    request a resync
//! ```
//!
//! `/admin/*` requires `Authorization: Bearer <key>` when a key is configured.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::lifecycle::Shutdown;
use crate::process::ProcessState;
use crate::sync::{StatusBoard, Trigger};

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub status: Arc<StatusBoard>,
    /// Absent when no proxy process is supervised.
    pub process: Option<watch::Receiver<ProcessState>>,
    pub triggers: mpsc::Sender<Trigger>,
    pub api_key: Option<Arc<str>>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    let admin = Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/info", get(get_info))
        .route("/admin/sync", post(request_sync))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    shutdown: Shutdown,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}
