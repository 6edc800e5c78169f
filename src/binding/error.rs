//! Error definitions for the binding subsystem

use thiserror::Error;

use crate::binding::settings::BindingSlot;

/// Errors raised by capture sessions and run-status transitions
///
/// None of these should take the process down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A capture was requested while another slot is still capturing
    #[error("Capture already active for {active}, cannot capture {requested}")]
    SessionBusy {
        active: BindingSlot,
        requested: BindingSlot,
    },

    /// The observed device disappeared before a press was captured
    #[error("Capture for {slot} aborted: active device disconnected")]
    CaptureAborted { slot: BindingSlot },

    /// Start was requested without its preconditions
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The macro backend refused to engage; the run status is now Error
    #[error("Macro backend failed: {0}")]
    Backend(#[from] ExecutorError),
}

/// Errors reported by a macro executor backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
