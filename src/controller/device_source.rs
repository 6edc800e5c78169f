//! Device enumeration seam
//!
//! [`DeviceSource`] is the only place the sampler touches the platform. The
//! production implementation wraps `gilrs`; tests use an in-memory source.

use gilrs::{Axis, Button, Event, EventType, Gamepad, Gilrs};
use tracing::{debug, error, info, warn};

use crate::controller::snapshot::{ButtonState, DeviceReading};

/// Standard gamepad button order. Index in this table is the logical button
/// index exposed in snapshots.
pub const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,         // 0
    Button::East,          // 1
    Button::West,          // 2
    Button::North,         // 3
    Button::LeftTrigger,   // 4  L1 / LB
    Button::RightTrigger,  // 5  R1 / RB
    Button::LeftTrigger2,  // 6  L2 / LT
    Button::RightTrigger2, // 7  R2 / RT
    Button::Select,        // 8
    Button::Start,         // 9
    Button::LeftThumb,     // 10
    Button::RightThumb,    // 11
    Button::DPadUp,        // 12
    Button::DPadDown,      // 13
    Button::DPadLeft,      // 14
    Button::DPadRight,     // 15
    Button::Mode,          // 16
];

pub const STANDARD_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Attach/detach notification observed while pumping platform events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HotplugEvent {
    Attached(String),
    Detached(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SamplerError {
    #[error("Device enumeration unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Platform facility that lists attached controllers
pub trait DeviceSource: Send {
    /// Processes pending platform events and reports attach/detach notifications.
    fn pump(&mut self) -> Vec<HotplugEvent>;

    /// Lists devices in enumeration order.
    fn enumerate(&mut self) -> Result<Vec<DeviceReading>, SamplerError>;

    fn name(&self) -> &str;
}

/// `gilrs`-backed device source
pub struct GilrsSource {
    gilrs: Gilrs,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SamplerError> {
        info!("Initializing gilrs controller interface");
        match Gilrs::new() {
            Ok(gilrs) => {
                info!("Successfully initialized gilrs");
                let source = Self { gilrs };
                source.log_gamepads();
                Ok(source)
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                Err(SamplerError::DeviceUnavailable(e.to_string()))
            }
        }
    }

    fn log_gamepads(&self) {
        let gamepads: Vec<_> = self.gilrs.gamepads().collect();
        if gamepads.is_empty() {
            warn!("No gamepad connected, sampling will report disconnected");
            return;
        }
        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                idx,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
        }
    }
}

impl DeviceSource for GilrsSource {
    fn pump(&mut self) -> Vec<HotplugEvent> {
        let mut hotplug = Vec::new();

        // gilrs only updates cached gamepad state while events are drained
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    let label = device_label(&self.gilrs.gamepad(id));
                    info!("Controller connected: {}", label);
                    hotplug.push(HotplugEvent::Attached(label));
                }
                EventType::Disconnected => {
                    let label = device_label(&self.gilrs.gamepad(id));
                    warn!("Controller disconnected: {}", label);
                    hotplug.push(HotplugEvent::Detached(label));
                }
                _ => {}
            }
        }

        hotplug
    }

    fn enumerate(&mut self) -> Result<Vec<DeviceReading>, SamplerError> {
        Ok(self
            .gilrs
            .gamepads()
            .map(|(_, gamepad)| read_gamepad(&gamepad))
            .collect())
    }

    fn name(&self) -> &str {
        "gilrs"
    }
}

fn read_gamepad(gamepad: &Gamepad<'_>) -> DeviceReading {
    let buttons = STANDARD_BUTTONS
        .iter()
        .map(|&button| {
            let pressed = gamepad.is_pressed(button);
            let value = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(if pressed { 1.0 } else { 0.0 });
            ButtonState::new(pressed, value)
        })
        .collect();

    let axes = STANDARD_AXES
        .iter()
        .map(|&axis| gamepad.value(axis).clamp(-1.0, 1.0))
        .collect();

    let reading = DeviceReading {
        present: gamepad.is_connected(),
        id: device_label(gamepad),
        buttons,
        axes,
    };
    debug!("Read gamepad {}: present={}", reading.id, reading.present);
    reading
}

fn device_label(gamepad: &Gamepad<'_>) -> String {
    match (gamepad.vendor_id(), gamepad.product_id()) {
        (Some(vendor), Some(product)) => format!(
            "{} (Vendor: {:04x} Product: {:04x})",
            gamepad.name(),
            vendor,
            product
        ),
        _ => gamepad.name().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared handle to the device list a [`ScriptedSource`] reports
    #[derive(Clone, Default)]
    pub struct DeviceScript {
        inner: Arc<Mutex<ScriptState>>,
    }

    #[derive(Default)]
    struct ScriptState {
        devices: Vec<DeviceReading>,
        hotplug: Vec<HotplugEvent>,
        fail_next: bool,
    }

    impl DeviceScript {
        pub fn set_devices(&self, devices: Vec<DeviceReading>) {
            self.inner.lock().unwrap().devices = devices;
        }

        pub fn push_hotplug(&self, event: HotplugEvent) {
            self.inner.lock().unwrap().hotplug.push(event);
        }

        pub fn fail_next_enumeration(&self) {
            self.inner.lock().unwrap().fail_next = true;
        }

        pub fn source(&self) -> ScriptedSource {
            ScriptedSource {
                script: self.clone(),
            }
        }
    }

    pub struct ScriptedSource {
        script: DeviceScript,
    }

    impl DeviceSource for ScriptedSource {
        fn pump(&mut self) -> Vec<HotplugEvent> {
            std::mem::take(&mut self.script.inner.lock().unwrap().hotplug)
        }

        fn enumerate(&mut self) -> Result<Vec<DeviceReading>, SamplerError> {
            let mut state = self.script.inner.lock().unwrap();
            if state.fail_next {
                state.fail_next = false;
                return Err(SamplerError::DeviceUnavailable(
                    "scripted failure".to_string(),
                ));
            }
            Ok(state.devices.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    pub fn pad(id: &str, pressed: &[usize]) -> DeviceReading {
        let buttons = (0..STANDARD_BUTTONS.len())
            .map(|index| {
                if pressed.contains(&index) {
                    ButtonState::pressed()
                } else {
                    ButtonState::released()
                }
            })
            .collect();
        DeviceReading {
            present: true,
            id: id.to_string(),
            buttons,
            axes: vec![0.0; STANDARD_AXES.len()],
        }
    }

    pub fn absent(id: &str) -> DeviceReading {
        DeviceReading {
            present: false,
            ..pad(id, &[])
        }
    }
}
