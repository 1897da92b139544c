//! Configuration synchronisation subsystem.
//!
//! # Data Flow
//! ```text
//! reconciler.rs (trigger: state change / tick / SIGHUP / admin)
//!     → load DesiredState
//!     → controller.rs
//!         → capacity sizing + template render
//!         → validator.rs (proxy syntax check on a temp file)
//!         → decision.rs (byte-exact compare with committed file)
//!         → commit.rs (atomic overwrite of committed file)
//!         → ProcessControl::reload (live reload, no restart)
//!     → status.rs (last outcome, for the admin API)
//! ```
//!
//! # Design Decisions
//! - An invalid candidate never reaches the committed path
//! - Unchanged output means no write and no signal
//! - A failed reload signal does not roll back the committed file; the
//!   file is valid and the next cycle or restart picks it up

pub mod commit;
pub mod controller;
pub mod decision;
pub mod reconciler;
pub mod status;
pub mod validator;

pub use controller::{SyncController, SyncOutcome, SyncSettings};
pub use decision::{needs_reload, ConfigDiff, DecisionEngine, DiffResult, ReloadDecision};
pub use reconciler::{Reconciler, Trigger};
pub use status::{StatusBoard, SyncStatus};
pub use validator::{ValidationResult, Validator};
