//! Controller subsystem: per-tick gamepad sampling
//!
//! 1. [`device_source`] - Platform enumeration (`gilrs`) behind a trait seam
//! 2. [`sampler`] - Active-device selection and snapshot production
//! 3. [`snapshot`] - Immutable per-tick device state
//!
//! ```text
//! DeviceSource ──► DeviceSampler ──► DeviceSnapshot
//!  (enumerate)     (first present)   (one per tick)
//! ```

pub mod device_source;
pub mod sampler;
pub mod snapshot;

pub use device_source::{DeviceSource, GilrsSource, HotplugEvent, SamplerError};
pub use sampler::{DeviceSampler, SampleOutcome};
pub use snapshot::{ButtonState, DeviceReading, DeviceSnapshot};
