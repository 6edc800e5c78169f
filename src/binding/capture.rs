//! "Capture next press" binding sessions
//!
//! At most one session is active at a time. While active, every snapshot is
//! scanned once; the lowest pressed index resolves the session and is written
//! into the [`BindingStore`]. There is no debounce and no timeout: a single
//! positive reading is enough, and an unresolved session waits until it is
//! cancelled.
//!
//! A session watches the device that was connected when it began. Begun with
//! nothing connected, it adopts the first device that appears.

use chrono::Local;
use tracing::{debug, info};

use crate::binding::error::BindingError;
use crate::binding::settings::{BindingSlot, BindingStore, BoundButton};
use crate::controller::snapshot::DeviceSnapshot;

/// How the most recent session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Bound {
        slot: BindingSlot,
        button: BoundButton,
    },
    Aborted {
        slot: BindingSlot,
    },
}

#[derive(Debug)]
struct ActiveSession {
    slot: BindingSlot,
    // None only while waiting for a device to appear
    observed_device: Option<String>,
}

#[derive(Debug, Default)]
pub struct CaptureController {
    session: Option<ActiveSession>,
    last_outcome: Option<CaptureOutcome>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_slot(&self) -> Option<BindingSlot> {
        self.session.as_ref().map(|session| session.slot)
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    pub fn last_outcome(&self) -> Option<&CaptureOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn begin_capture(
        &mut self,
        slot: BindingSlot,
        current: &DeviceSnapshot,
    ) -> Result<(), BindingError> {
        if let Some(active) = self.active_slot() {
            debug!("Refusing capture for {}: {} is capturing", slot, active);
            return Err(BindingError::SessionBusy {
                active,
                requested: slot,
            });
        }

        let observed_device = current.connected.then(|| current.device_id.clone());
        match &observed_device {
            Some(device) => info!("Capture started for {} on {}", slot, device),
            None => info!("Capture started for {}, waiting for a controller", slot),
        }
        self.session = Some(ActiveSession {
            slot,
            observed_device,
        });
        self.last_outcome = None;
        Ok(())
    }

    /// Ends the active session without binding. No-op when idle.
    pub fn cancel_capture(&mut self) -> Option<BindingSlot> {
        let slot = self.session.take().map(|session| session.slot);
        match slot {
            Some(slot) => info!("Capture for {} cancelled", slot),
            None => debug!("Cancel requested with no active capture"),
        }
        slot
    }

    /// Advances the active session by one snapshot.
    ///
    /// Returns the resolved button when this snapshot completed the session,
    /// `Ok(None)` when idle or still waiting, and
    /// [`BindingError::CaptureAborted`] when the observed device went away.
    pub fn on_snapshot(
        &mut self,
        snapshot: &DeviceSnapshot,
        store: &mut BindingStore,
    ) -> Result<Option<BoundButton>, BindingError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let slot = session.slot;

        let device_lost = match (&session.observed_device, snapshot.connected) {
            (Some(_), false) => true,
            (Some(observed), true) => *observed != snapshot.device_id,
            (None, _) => false,
        };
        if device_lost {
            debug!("Capture for {} aborted at tick {}", slot, snapshot.tick);
            self.session = None;
            self.last_outcome = Some(CaptureOutcome::Aborted { slot });
            return Err(BindingError::CaptureAborted { slot });
        }

        if !snapshot.connected {
            return Ok(None);
        }
        if session.observed_device.is_none() {
            debug!("Capture for {} watching {}", slot, snapshot.device_id);
            session.observed_device = Some(snapshot.device_id.clone());
        }

        let Some(index) = snapshot.first_pressed() else {
            return Ok(None);
        };

        let button = BoundButton::from_index(index);
        info!(
            "Captured {} for {} at {}",
            button,
            slot,
            Local::now().format("%H:%M:%S.%3f")
        );
        self.session = None;
        store.bind(slot, button.clone());
        self.last_outcome = Some(CaptureOutcome::Bound {
            slot,
            button: button.clone(),
        });
        Ok(Some(button))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device_source::testing::pad;

    fn snapshot(id: &str, pressed: &[usize]) -> DeviceSnapshot {
        DeviceSnapshot::from_reading(pad(id, pressed))
    }

    fn capturing(slot: BindingSlot, id: &str) -> CaptureController {
        let mut capture = CaptureController::new();
        capture.begin_capture(slot, &snapshot(id, &[])).unwrap();
        capture
    }

    #[test]
    fn cancel_without_session_is_noop() {
        let mut capture = CaptureController::new();
        assert_eq!(capture.cancel_capture(), None);
        assert_eq!(capture.cancel_capture(), None);
        assert!(!capture.is_capturing());
    }

    #[test]
    fn press_resolves_edit_binding() {
        let mut capture = capturing(BindingSlot::Edit, "pad");
        let mut store = BindingStore::new();

        let resolved = capture
            .on_snapshot(&snapshot("pad", &[3]), &mut store)
            .unwrap();

        assert_eq!(resolved, Some(BoundButton::from_index(3)));
        assert_eq!(
            store.settings().edit_button.as_ref().map(|b| b.label.as_str()),
            Some("Button 3")
        );
        assert_eq!(store.settings().select_button, None);
        assert!(!capture.is_capturing());
        assert!(matches!(
            capture.last_outcome(),
            Some(CaptureOutcome::Bound { slot: BindingSlot::Edit, .. })
        ));
    }

    #[test]
    fn lowest_index_wins() {
        let mut capture = capturing(BindingSlot::Select, "pad");
        let mut store = BindingStore::new();

        capture
            .on_snapshot(&snapshot("pad", &[9, 5, 14]), &mut store)
            .unwrap();
        assert_eq!(store.settings().select_button, Some(BoundButton::from_index(5)));
    }

    #[test]
    fn busy_session_is_not_overwritten() {
        let mut capture = capturing(BindingSlot::Edit, "pad");

        let err = capture
            .begin_capture(BindingSlot::Select, &snapshot("pad", &[]))
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::SessionBusy {
                active: BindingSlot::Edit,
                requested: BindingSlot::Select,
            }
        );
        assert_eq!(capture.active_slot(), Some(BindingSlot::Edit));
    }

    #[test]
    fn disconnect_aborts_without_binding() {
        let mut capture = capturing(BindingSlot::Edit, "pad");
        let mut store = BindingStore::new();
        assert_eq!(capture.on_snapshot(&snapshot("pad", &[]), &mut store), Ok(None));

        // stale buttons on a disconnected snapshot must not resolve anything
        let mut gone = snapshot("pad", &[2]);
        gone.connected = false;
        let err = capture.on_snapshot(&gone, &mut store).unwrap_err();

        assert_eq!(err, BindingError::CaptureAborted { slot: BindingSlot::Edit });
        assert_eq!(store.settings().edit_button, None);
        assert_eq!(store.settings().select_button, None);
        assert!(!capture.is_capturing());
        assert_eq!(
            capture.last_outcome(),
            Some(&CaptureOutcome::Aborted { slot: BindingSlot::Edit })
        );
    }

    #[test]
    fn unplug_before_first_tick_aborts() {
        let mut capture = capturing(BindingSlot::Edit, "first");
        let mut store = BindingStore::new();

        let err = capture
            .on_snapshot(&DeviceSnapshot::disconnected(), &mut store)
            .unwrap_err();
        assert_eq!(err, BindingError::CaptureAborted { slot: BindingSlot::Edit });

        assert_eq!(
            capture.on_snapshot(&snapshot("second", &[5]), &mut store),
            Ok(None)
        );
        assert_eq!(store.settings().edit_button, None);
    }

    #[test]
    fn device_swap_aborts() {
        let mut capture = capturing(BindingSlot::Select, "first");
        let mut store = BindingStore::new();

        let err = capture
            .on_snapshot(&snapshot("second", &[1]), &mut store)
            .unwrap_err();
        assert_eq!(err, BindingError::CaptureAborted { slot: BindingSlot::Select });
        assert_eq!(store.settings().select_button, None);
    }

    #[test]
    fn session_waits_for_a_device() {
        let mut capture = CaptureController::new();
        let mut store = BindingStore::new();
        capture
            .begin_capture(BindingSlot::Edit, &DeviceSnapshot::disconnected())
            .unwrap();

        assert_eq!(
            capture.on_snapshot(&DeviceSnapshot::disconnected(), &mut store),
            Ok(None)
        );
        assert!(capture.is_capturing());

        capture.on_snapshot(&snapshot("pad", &[0]), &mut store).unwrap();
        assert_eq!(store.settings().edit_button, Some(BoundButton::from_index(0)));
    }

    #[test]
    fn resolved_session_ignores_later_presses() {
        let mut capture = capturing(BindingSlot::Edit, "pad");
        let mut store = BindingStore::new();
        capture.on_snapshot(&snapshot("pad", &[3]), &mut store).unwrap();

        assert_eq!(capture.on_snapshot(&snapshot("pad", &[1]), &mut store), Ok(None));
        assert_eq!(store.settings().edit_button, Some(BoundButton::from_index(3)));
    }

    #[test]
    fn begin_clears_previous_outcome() {
        let mut capture = capturing(BindingSlot::Edit, "pad");
        let mut store = BindingStore::new();
        capture.on_snapshot(&snapshot("pad", &[3]), &mut store).unwrap();
        assert!(capture.last_outcome().is_some());

        capture
            .begin_capture(BindingSlot::Select, &snapshot("pad", &[]))
            .unwrap();
        assert_eq!(capture.last_outcome(), None);
    }
}
