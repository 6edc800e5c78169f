use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Logical action a physical button can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSlot {
    Edit,
    Select,
}

impl fmt::Display for BindingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSlot::Edit => write!(f, "Edit"),
            BindingSlot::Select => write!(f, "Select"),
        }
    }
}

/// A physical button index resolved by a capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundButton {
    pub index: usize,
    pub label: String,
}

impl BoundButton {
    pub fn from_index(index: usize) -> Self {
        Self {
            index,
            label: format!("Button {}", index),
        }
    }
}

impl fmt::Display for BoundButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSettings {
    pub edit_button: Option<BoundButton>,
    pub select_button: Option<BoundButton>,
    pub delay_ms: u32,
    pub use_reset_macro: bool,
    pub break_polling_rate: bool,
}

impl MacroSettings {
    pub fn binding(&self, slot: BindingSlot) -> Option<&BoundButton> {
        match slot {
            BindingSlot::Edit => self.edit_button.as_ref(),
            BindingSlot::Select => self.select_button.as_ref(),
        }
    }
}

/// Owner of the current [`MacroSettings`]
///
/// Button bindings can only be written from inside the `binding` module, which
/// in practice means the capture controller. Everything else goes through the
/// user-facing setters.
#[derive(Debug, Default)]
pub struct BindingStore {
    settings: MacroSettings,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &MacroSettings {
        &self.settings
    }

    pub(super) fn bind(&mut self, slot: BindingSlot, button: BoundButton) {
        info!("Binding {} to {}", slot, button);
        match slot {
            BindingSlot::Edit => self.settings.edit_button = Some(button),
            BindingSlot::Select => self.settings.select_button = Some(button),
        }
    }

    /// Sets the delay from raw text input and returns the stored value.
    pub fn set_delay_input(&mut self, raw: &str) -> u32 {
        let delay = parse_delay(raw);
        debug!("Delay input {:?} coerced to {}ms", raw, delay);
        self.settings.delay_ms = delay;
        delay
    }

    pub fn set_delay_ms(&mut self, delay_ms: i64) -> u32 {
        let delay = u32::try_from(delay_ms.max(0)).unwrap_or(u32::MAX);
        self.settings.delay_ms = delay;
        delay
    }

    pub fn set_use_reset_macro(&mut self, enabled: bool) {
        debug!("use_reset_macro = {}", enabled);
        self.settings.use_reset_macro = enabled;
    }

    pub fn toggle_use_reset_macro(&mut self) -> bool {
        self.set_use_reset_macro(!self.settings.use_reset_macro);
        self.settings.use_reset_macro
    }

    pub fn set_break_polling_rate(&mut self, enabled: bool) {
        debug!("break_polling_rate = {}", enabled);
        self.settings.break_polling_rate = enabled;
    }

    pub fn toggle_break_polling_rate(&mut self) -> bool {
        self.set_break_polling_rate(!self.settings.break_polling_rate);
        self.settings.break_polling_rate
    }
}

/// Leading-integer parse: `"15ms"` is 15, anything non-numeric or negative is 0.
fn parse_delay(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return 0;
    }

    digits
        .bytes()
        .try_fold(0u32, |acc, d| {
            acc.checked_mul(10)?.checked_add(u32::from(d - b'0'))
        })
        .unwrap_or(u32::MAX)
}
