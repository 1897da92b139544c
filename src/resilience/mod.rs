//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Sync cycle fails:
//!     → backoff.rs (exponential delay with jitter)
//!     → reconciler waits, then retries the whole cycle
//! Sync cycle succeeds:
//!     → backoff reset
//! ```
//!
//! # Design Decisions
//! - A failed cycle is retried as a whole; there is no partial resume
//! - New desired state or an explicit request still runs immediately

pub mod backoff;

pub use backoff::{calculate_backoff, RetryBackoff};
