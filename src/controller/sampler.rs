use statum::{machine, state};
use tracing::{debug, info, warn};

use crate::controller::device_source::{DeviceSource, HotplugEvent, SamplerError};
use crate::controller::snapshot::DeviceSnapshot;

#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Initializing,
    Sampling,
}

/// Result of one sampling tick
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub snapshot: DeviceSnapshot,
    /// An attach/detach notification arrived since the previous tick
    pub hotplug_seen: bool,
}

#[machine]
pub struct DeviceSampler<S: SamplerState> {
    // None once the enumeration facility is unavailable; never comes back
    source: Option<Box<dyn DeviceSource>>,

    // Ticks sampled so far
    tick: u64,

    // Device chosen on the previous tick, only used for change logging
    last_device: Option<String>,
}

impl<S: SamplerState> DeviceSampler<S> {
    pub fn is_degraded(&self) -> bool {
        self.source.is_none()
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

impl DeviceSampler<Initializing> {
    /// Creates a sampler over `source`, or a permanently disconnected one when
    /// the platform could not provide a device source.
    pub fn create(source: Result<Box<dyn DeviceSource>, SamplerError>) -> Self {
        let source = match source {
            Ok(source) => {
                debug!("Creating DeviceSampler over source '{}'", source.name());
                Some(source)
            }
            Err(e) => {
                warn!("{}; sampler will report disconnected", e);
                None
            }
        };
        Self::new(source, 0, None)
    }

    pub fn initialize(self) -> DeviceSampler<Sampling> {
        info!(
            "Device sampler initialized (degraded: {}), transitioning to Sampling state",
            self.is_degraded()
        );
        self.transition()
    }
}

impl DeviceSampler<Sampling> {
    /// Samples the first present device, re-enumerating from scratch.
    pub fn sample(&mut self) -> SampleOutcome {
        self.tick += 1;

        let Some(source) = self.source.as_mut() else {
            return SampleOutcome {
                snapshot: DeviceSnapshot::disconnected().with_tick(self.tick),
                hotplug_seen: false,
            };
        };

        let hotplug = source.pump();
        for event in &hotplug {
            match event {
                HotplugEvent::Attached(id) => debug!("Hotplug attach: {}", id),
                HotplugEvent::Detached(id) => debug!("Hotplug detach: {}", id),
            }
        }

        let devices = match source.enumerate() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Device enumeration failed, degrading to disconnected: {}", e);
                self.source = None;
                self.last_device = None;
                return SampleOutcome {
                    snapshot: DeviceSnapshot::disconnected().with_tick(self.tick),
                    hotplug_seen: !hotplug.is_empty(),
                };
            }
        };

        let snapshot = match devices.into_iter().find(|device| device.present) {
            Some(reading) => DeviceSnapshot::from_reading(reading),
            None => DeviceSnapshot::disconnected(),
        }
        .with_tick(self.tick);

        let current = snapshot.connected.then(|| snapshot.device_id.clone());
        if current != self.last_device {
            match &current {
                Some(id) => info!("Active device: {}", id),
                None => info!("No active device"),
            }
            self.last_device = current;
        }

        SampleOutcome {
            snapshot,
            hotplug_seen: !hotplug.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device_source::testing::{absent, pad, DeviceScript};

    fn sampler(script: &DeviceScript) -> DeviceSampler<Sampling> {
        DeviceSampler::create(Ok(Box::new(script.source()))).initialize()
    }

    #[test]
    fn no_device_yields_disconnected_snapshot() {
        let script = DeviceScript::default();
        let mut sampler = sampler(&script);

        let outcome = sampler.sample();
        assert!(!outcome.snapshot.connected);
        assert!(outcome.snapshot.device_id.is_empty());
        assert!(outcome.snapshot.buttons.is_empty());
        assert!(outcome.snapshot.axes.is_empty());
    }

    #[test]
    fn first_present_device_wins() {
        let script = DeviceScript::default();
        script.set_devices(vec![absent("gone"), pad("first", &[]), pad("second", &[0])]);
        let mut sampler = sampler(&script);

        let snapshot = sampler.sample().snapshot;
        assert!(snapshot.connected);
        assert_eq!(snapshot.device_id, "first");
        assert_eq!(snapshot.first_pressed(), None);
    }

    #[test]
    fn selection_is_recomputed_every_tick() {
        let script = DeviceScript::default();
        script.set_devices(vec![pad("first", &[]), pad("second", &[])]);
        let mut sampler = sampler(&script);
        assert_eq!(sampler.sample().snapshot.device_id, "first");

        script.set_devices(vec![absent("first"), pad("second", &[])]);
        let snapshot = sampler.sample().snapshot;
        assert_eq!(snapshot.device_id, "second");
        assert_eq!(snapshot.tick, 2);
    }

    #[test]
    fn unavailable_source_stays_disconnected() {
        let mut sampler = DeviceSampler::create(Err(SamplerError::DeviceUnavailable(
            "no backend".to_string(),
        )))
        .initialize();

        assert!(sampler.is_degraded());
        for _ in 0..3 {
            assert!(!sampler.sample().snapshot.connected);
        }
        assert_eq!(sampler.ticks(), 3);
    }

    #[test]
    fn enumeration_failure_degrades_permanently() {
        let script = DeviceScript::default();
        script.set_devices(vec![pad("pad", &[])]);
        let mut sampler = sampler(&script);
        assert!(sampler.sample().snapshot.connected);

        script.fail_next_enumeration();
        assert!(!sampler.sample().snapshot.connected);
        assert!(sampler.is_degraded());

        // the device is still listed, but the source is gone for good
        assert!(!sampler.sample().snapshot.connected);
    }

    #[test]
    fn hotplug_is_reported() {
        let script = DeviceScript::default();
        let mut sampler = sampler(&script);
        assert!(!sampler.sample().hotplug_seen);

        script.push_hotplug(HotplugEvent::Attached("pad".to_string()));
        script.set_devices(vec![pad("pad", &[])]);
        let outcome = sampler.sample();
        assert!(outcome.hotplug_seen);
        assert!(outcome.snapshot.connected);
        assert!(!sampler.sample().hotplug_seen);
    }
}
