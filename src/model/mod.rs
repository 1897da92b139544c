//! Desired state model.
//!
//! # Data Flow
//! ```text
//! external watcher (control plane)
//!     → DesiredState (servers, backends, options bag)
//!     → custom.rs parses the options bag into CustomConfig
//!     → consumed read-only by one synchronisation cycle
//! ```
//!
//! # Design Decisions
//! - The model is plain data; it carries no behaviour beyond parsing
//! - Server order is preserved, since it drives rendered output order
//! - Options stay a string bag on the wire and are typed only on read

pub mod custom;
pub mod state;

pub use custom::CustomConfig;
pub use state::{
    load_state, Backend, DesiredState, Endpoint, L4Backend, Location, PassthroughBackend, Server,
    StateError, TlsInfo,
};
