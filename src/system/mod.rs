//! Host environment inputs.
//!
//! # Responsibilities
//! - Read kernel limits that shape the rendered configuration
//!
//! # Design Decisions
//! - Read once per cycle, never cached across cycles
//! - Unreadable values fall back to nginx's own defaults

pub mod sysctl;

pub use sysctl::{read_somaxconn, DEFAULT_BACKLOG};
