//! Engine subsystem: the tick loop and its public handle
//!
//! 1. [`binder_engine`] - Owns all binding state, runs one tick per frame
//! 2. [`binder_handle`] - Async request/reply API and lifecycle
//! 3. [`consumers`] - Built-in snapshot observers

pub mod binder_engine;
pub mod binder_handle;
pub mod consumers;

pub use binder_engine::{BinderCommand, BinderEngine, BinderView, SnapshotConsumer};
pub use binder_handle::BinderHandle;
pub use consumers::ActivityLogger;

use crate::binding::BindingError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Engine task error: {0}")]
    TaskError(String),
}
