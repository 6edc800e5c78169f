use chrono::{DateTime, Local};

/// State of a single physical button for one tick
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ButtonState {
    pub pressed: bool,
    /// Analog value in 0.0..=1.0; digital buttons report 0.0 or 1.0
    pub value: f32,
}

impl ButtonState {
    pub fn new(pressed: bool, value: f32) -> Self {
        Self {
            pressed,
            value: value.clamp(0.0, 1.0),
        }
    }

    pub fn released() -> Self {
        Self::default()
    }

    pub fn pressed() -> Self {
        Self::new(true, 1.0)
    }
}

/// One device as reported by a [`DeviceSource`](super::device_source::DeviceSource)
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceReading {
    pub present: bool,
    pub id: String,
    pub buttons: Vec<ButtonState>,
    pub axes: Vec<f32>,
}

/// Immutable read of the active device for one tick
///
/// Indices into `buttons` are only meaningful for the connection that produced
/// them. Consumers must bounds-check against this snapshot every tick instead
/// of holding on to indices from an earlier one.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSnapshot {
    pub connected: bool,
    pub device_id: String,
    pub buttons: Vec<ButtonState>,
    pub axes: Vec<f32>,

    // Sampling metadata
    pub tick: u64,
    pub sampled_at: DateTime<Local>,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl DeviceSnapshot {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            device_id: String::new(),
            buttons: Vec::new(),
            axes: Vec::new(),
            tick: 0,
            sampled_at: Local::now(),
        }
    }

    pub fn from_reading(reading: DeviceReading) -> Self {
        Self {
            connected: true,
            device_id: reading.id,
            buttons: reading.buttons,
            axes: reading
                .axes
                .into_iter()
                .map(|value| value.clamp(-1.0, 1.0))
                .collect(),
            tick: 0,
            sampled_at: Local::now(),
        }
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Lowest index currently pressed
    pub fn first_pressed(&self) -> Option<usize> {
        self.buttons.iter().position(|button| button.pressed)
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons
            .get(index)
            .map(|button| button.pressed)
            .unwrap_or(false)
    }
}
