//! Configuration sync and hot-reload controller for an nginx instance.

// Inputs
pub mod config;
pub mod model;

// Rendering
pub mod capacity;
pub mod template;

// Commit and signal
pub mod process;
pub mod sync;
pub mod system;

// Cross-cutting concerns
pub mod admin;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod version;

pub use config::ControllerConfig;
pub use error::SyncError;
pub use lifecycle::Shutdown;
pub use sync::{SyncController, SyncOutcome};
