use tracing::{debug, info};

use crate::binding::visualizer::{self, Marker};
use crate::controller::snapshot::DeviceSnapshot;
use crate::engine::binder_engine::SnapshotConsumer;

/// Logs connection changes and markers lighting up
pub struct ActivityLogger {
    markers: Vec<(Marker, usize)>,
    connected: Option<String>,
    lit: Vec<Marker>,
}

impl ActivityLogger {
    pub fn new(markers: &[(Marker, usize)]) -> Self {
        Self {
            markers: markers.to_vec(),
            connected: None,
            lit: Vec::new(),
        }
    }

    pub fn lit(&self) -> &[Marker] {
        &self.lit
    }
}

impl SnapshotConsumer for ActivityLogger {
    fn on_snapshot(&mut self, snapshot: &DeviceSnapshot) {
        let connected = snapshot.connected.then(|| snapshot.device_id.clone());
        if connected != self.connected {
            info!("{}", visualizer::connection_label(snapshot));
            self.connected = connected;
        }

        let lit: Vec<Marker> = visualizer::highlights(snapshot, &self.markers)
            .into_iter()
            .filter(|highlight| highlight.lit)
            .map(|highlight| highlight.marker)
            .collect();
        if lit != self.lit {
            debug!("Lit markers: {:?}", lit);
            self.lit = lit;
        }
    }
}
