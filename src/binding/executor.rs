//! Macro execution backend seam
//!
//! Input injection is out of scope; [`StubExecutor`] only records and logs
//! what a real backend would be asked to do.

use tracing::info;

use crate::binding::error::ExecutorError;
use crate::binding::settings::MacroSettings;

pub trait MacroExecutor: Send {
    fn engage(&mut self, settings: &MacroSettings) -> Result<(), ExecutorError>;
    fn disengage(&mut self);
}

#[derive(Debug, Default)]
pub struct StubExecutor {
    engaged: Option<MacroSettings>,
}

impl StubExecutor {
    pub fn is_engaged(&self) -> bool {
        self.engaged.is_some()
    }
}

impl MacroExecutor for StubExecutor {
    fn engage(&mut self, settings: &MacroSettings) -> Result<(), ExecutorError> {
        info!(
            "Macro engaged (stub): edit={:?} select={:?} delay={}ms reset={} turbo={}",
            settings.edit_button.as_ref().map(|b| b.label.as_str()),
            settings.select_button.as_ref().map(|b| b.label.as_str()),
            settings.delay_ms,
            settings.use_reset_macro,
            settings.break_polling_rate
        );
        self.engaged = Some(settings.clone());
        Ok(())
    }

    fn disengage(&mut self) {
        if self.engaged.take().is_some() {
            info!("Macro disengaged (stub)");
        }
    }
}
