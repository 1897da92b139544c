//! Template rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Per cycle:
//!     DesiredState + base CustomConfig
//!     → options.rs (overlay options bag, raise hash sizing floors)
//!     → EffectiveOptions
//!     → renderer.rs (tera) → candidate configuration bytes
//!
//! On template change:
//!     config/watcher.rs detects change
//!     → store.rs compiles a new Renderer
//!     → atomic swap of Arc<Renderer> on success
//!     → old Renderer kept on failure
//! ```
//!
//! # Design Decisions
//! - Rendering is a pure function of state and options
//! - A template that fails to compile is never published
//! - Readers grab an Arc snapshot; a swap never disturbs a render in flight

pub mod options;
pub mod renderer;
pub mod store;

pub use options::EffectiveOptions;
pub use renderer::Renderer;
pub use store::TemplateStore;
