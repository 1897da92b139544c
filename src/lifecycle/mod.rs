//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load template → Seed config → Start proxy → Watchers → Reconcile
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Loops exit → Process exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger resync
//! ```
//!
//! # Design Decisions
//! - Ordered startup: template first, then proxy, then loops
//! - The proxy process is killed when the controller exits

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, seed_committed, StartupError};
