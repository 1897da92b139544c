//! Managed proxy process.
//!
//! # Data Flow
//! ```text
//! control.rs   ProcessControl capability: check / reload / run
//! nginx.rs     real implementation shelling out to the nginx binary
//! supervisor.rs
//!     start once in the foreground (failure is fatal)
//!     → watch the exit and report it
//! ```
//!
//! # Design Decisions
//! - Everything that shells out goes through ProcessControl so the sync
//!   pipeline can run against a fake in tests
//! - Reload uses the proxy's live-reload signal, never a restart
//! - Restart policy belongs to the surrounding supervision layer

pub mod control;
pub mod nginx;
pub mod supervisor;

pub use control::{CommandOutput, ExitReport, ProcessControl, ProcessHandle};
pub use nginx::NginxProcess;
pub use supervisor::{ProcessState, Supervisor};
