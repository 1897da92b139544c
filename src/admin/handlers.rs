use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;

use crate::admin::AdminState;
use crate::process::ProcessState;
use crate::sync::{SyncStatus, Trigger};
use crate::version::{self, BackendInfo};

#[derive(Serialize)]
pub struct StatusReport {
    pub sync: SyncStatus,
    pub process: Option<ProcessState>,
}

#[derive(Serialize)]
pub struct SyncAccepted {
    pub queued: bool,
}

pub async fn healthz(State(state): State<AdminState>) -> (StatusCode, &'static str) {
    match state.process.as_ref().map(|rx| rx.borrow().clone()) {
        Some(ProcessState::Exited { .. }) => (StatusCode::SERVICE_UNAVAILABLE, "proxy exited"),
        _ => (StatusCode::OK, "ok"),
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<StatusReport> {
    Json(StatusReport {
        sync: state.status.snapshot(),
        process: state.process.as_ref().map(|rx| rx.borrow().clone()),
    })
}

pub async fn get_info() -> Json<BackendInfo> {
    Json(version::info())
}

pub async fn request_sync(
    State(state): State<AdminState>,
) -> Result<(StatusCode, Json<SyncAccepted>), StatusCode> {
    match state.triggers.try_send(Trigger::Requested) {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(SyncAccepted { queued: true }))),
        // Coalesced with a request already waiting.
        Err(TrySendError::Full(_)) => Ok((StatusCode::ACCEPTED, Json(SyncAccepted { queued: false }))),
        Err(TrySendError::Closed(_)) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
