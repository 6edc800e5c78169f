//! Run-status state machine
//!
//! ```text
//! Ready ──start──► Running ──stop──► Stopped ──cooldown──► Ready
//!   │                 │
//!   └─────────────────┴──(executor failure)──► Error (terminal)
//! ```

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::binding::error::BindingError;
use crate::binding::executor::MacroExecutor;
use crate::binding::settings::MacroSettings;
use crate::controller::snapshot::DeviceSnapshot;

pub const DEFAULT_STOP_COOLDOWN: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Ready,
    Running,
    Stopped,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Ready => "Ready",
            RunStatus::Running => "Running...",
            RunStatus::Stopped => "Stopped",
            RunStatus::Error => "Error",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub struct RunStatusMachine {
    status: RunStatus,
    cooldown: Duration,
    stopped_at: Option<Instant>,
    last_error: Option<String>,
}

impl Default for RunStatusMachine {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_COOLDOWN)
    }
}

impl RunStatusMachine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            status: RunStatus::Ready,
            cooldown,
            stopped_at: None,
            last_error: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn start(
        &mut self,
        snapshot: &DeviceSnapshot,
        settings: &MacroSettings,
        executor: &mut dyn MacroExecutor,
    ) -> Result<(), BindingError> {
        match self.status {
            RunStatus::Ready => {}
            RunStatus::Running => {
                return Err(BindingError::ValidationFailed(
                    "macro is already running".to_string(),
                ))
            }
            RunStatus::Stopped => {
                return Err(BindingError::ValidationFailed(
                    "macro is still stopping".to_string(),
                ))
            }
            RunStatus::Error => {
                return Err(BindingError::ValidationFailed(
                    "macro backend failed; restart required".to_string(),
                ))
            }
        }

        if !snapshot.connected {
            warn!("Start refused: no controller connected");
            return Err(BindingError::ValidationFailed(
                "please connect a controller first".to_string(),
            ));
        }
        if settings.edit_button.is_none() {
            warn!("Start refused: edit button not configured");
            return Err(BindingError::ValidationFailed(
                "please configure the Edit button".to_string(),
            ));
        }

        match executor.engage(settings) {
            Ok(()) => {
                info!("Status {} -> {}", self.status, RunStatus::Running);
                self.status = RunStatus::Running;
                Ok(())
            }
            Err(e) => {
                error!("Macro backend failed to engage: {}", e);
                self.status = RunStatus::Error;
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Stops a running macro. Any other state is left alone.
    pub fn stop(&mut self, executor: &mut dyn MacroExecutor, now: Instant) {
        if self.status != RunStatus::Running {
            debug!("Stop ignored in status {}", self.status);
            return;
        }
        executor.disengage();
        info!("Status {} -> {}", self.status, RunStatus::Stopped);
        self.status = RunStatus::Stopped;
        self.stopped_at = Some(now);
    }

    /// Returns to Ready once the stop cooldown has elapsed.
    pub fn poll_cooldown(&mut self, now: Instant) -> bool {
        match (self.status, self.stopped_at) {
            (RunStatus::Stopped, Some(stopped_at))
                if now.saturating_duration_since(stopped_at) >= self.cooldown =>
            {
                info!("Status {} -> {}", self.status, RunStatus::Ready);
                self.status = RunStatus::Ready;
                self.stopped_at = None;
                true
            }
            _ => false,
        }
    }
}
