//! Binding subsystem: capture sessions, settings, run status
//!
//! Everything here is synchronous and driven from the engine tick; nothing in
//! this module spawns tasks or takes locks.

pub mod capture;
pub mod error;
pub mod executor;
pub mod settings;
pub mod status;
pub mod visualizer;

pub use capture::{CaptureController, CaptureOutcome};
pub use error::{BindingError, ExecutorError};
pub use executor::{MacroExecutor, StubExecutor};
pub use settings::{BindingSlot, BindingStore, BoundButton, MacroSettings};
pub use status::{RunStatus, RunStatusMachine};
pub use visualizer::{Marker, MarkerHighlight, DEFAULT_MARKERS};
