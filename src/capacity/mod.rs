//! Structural capacity sizing.
//!
//! # Data Flow
//! ```text
//! DesiredState.servers
//!     → hash.rs (hostname lengths → power-of-two table sizes)
//!     → raised against caller-supplied floors
//!     → EffectiveOptions (template input)
//! ```
//!
//! # Design Decisions
//! - nginx sizes its server-name hash at startup and cannot grow it at
//!   runtime, so capacity is computed up front from the full hostname set
//! - Sizing only ever raises a floor, never lowers one
//! - Pure arithmetic: no I/O, no failure modes

pub mod hash;

pub use hash::{compute_sizing, next_power_of_two, HashSizing};
