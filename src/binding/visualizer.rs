//! Per-marker highlight state for a controller diagram
//!
//! Pure functions over a snapshot. Out-of-range indices and disconnected
//! snapshots simply produce no highlights.

use crate::controller::snapshot::DeviceSnapshot;

const MAX_ID_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    FaceTop,
    FaceRight,
    FaceLeft,
    FaceBottom,
    DPadUp,
}

/// Marker drawn for each physical button index
pub const DEFAULT_MARKERS: [(Marker, usize); 5] = [
    (Marker::FaceTop, 3),
    (Marker::FaceRight, 1),
    (Marker::FaceLeft, 2),
    (Marker::FaceBottom, 0),
    (Marker::DPadUp, 12),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerHighlight {
    pub marker: Marker,
    pub lit: bool,
}

pub fn highlights(snapshot: &DeviceSnapshot, markers: &[(Marker, usize)]) -> Vec<MarkerHighlight> {
    markers
        .iter()
        .map(|&(marker, index)| MarkerHighlight {
            marker,
            lit: snapshot.connected && snapshot.is_pressed(index),
        })
        .collect()
}

pub fn connection_label(snapshot: &DeviceSnapshot) -> String {
    if !snapshot.connected {
        return "No Controller Connected".to_string();
    }
    if snapshot.device_id.chars().count() > MAX_ID_CHARS {
        let short: String = snapshot.device_id.chars().take(MAX_ID_CHARS).collect();
        format!("Connected: {}...", short)
    } else {
        format!("Connected: {}", snapshot.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device_source::testing::pad;

    #[test]
    fn pressed_buttons_light_their_markers() {
        let snapshot = DeviceSnapshot::from_reading(pad("pad", &[3, 12]));
        let lit: Vec<Marker> = highlights(&snapshot, &DEFAULT_MARKERS)
            .into_iter()
            .filter(|h| h.lit)
            .map(|h| h.marker)
            .collect();
        assert_eq!(lit, vec![Marker::FaceTop, Marker::DPadUp]);
    }

    #[test]
    fn out_of_range_index_is_not_lit() {
        let mut snapshot = DeviceSnapshot::from_reading(pad("pad", &[0]));
        snapshot.buttons.truncate(2);
        let result = highlights(&snapshot, &[(Marker::DPadUp, 12), (Marker::FaceBottom, 0)]);
        assert!(!result[0].lit);
        assert!(result[1].lit);
    }

    #[test]
    fn disconnected_snapshot_lights_nothing() {
        let mut snapshot = DeviceSnapshot::from_reading(pad("pad", &[0, 1, 2, 3]));
        snapshot.connected = false;
        assert!(highlights(&snapshot, &DEFAULT_MARKERS).iter().all(|h| !h.lit));
    }

    #[test]
    fn input_is_untouched() {
        let snapshot = DeviceSnapshot::from_reading(pad("pad", &[1]));
        let before = snapshot.clone();
        let _ = highlights(&snapshot, &DEFAULT_MARKERS);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn labels() {
        assert_eq!(
            connection_label(&DeviceSnapshot::disconnected()),
            "No Controller Connected"
        );
        assert_eq!(
            connection_label(&DeviceSnapshot::from_reading(pad("Short Pad", &[]))),
            "Connected: Short Pad"
        );
        assert_eq!(
            connection_label(&DeviceSnapshot::from_reading(pad(
                "Xbox Wireless Controller (Vendor: 045e Product: 0b13)",
                &[]
            ))),
            "Connected: Xbox Wireless Contro..."
        );
    }
}
