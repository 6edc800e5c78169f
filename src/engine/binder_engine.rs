//! Binder engine: the single scheduling domain
//!
//! One tokio task owns the sampler, the capture controller, the binding store
//! and the run-status machine. Each frame it runs exactly one tick; user
//! commands are applied between ticks. Because nothing else touches this
//! state, the "one capture session" flag needs no lock.
//!
//! ```text
//!              ┌───────────── tick (per frame) ─────────────┐
//! DeviceSampler ──► snapshot ──► CaptureController ──► BindingStore
//!                      │
//!                      ├──► SnapshotConsumers
//!                      └──► watch<snapshot>, watch<BinderView>
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binding::{
    visualizer, BindingError, BindingSlot, BindingStore, CaptureController, CaptureOutcome,
    MacroExecutor, MacroSettings, Marker, MarkerHighlight, RunStatus, RunStatusMachine,
    DEFAULT_MARKERS,
};
use crate::config::Config;
use crate::controller::sampler::{DeviceSampler, Sampling};
use crate::controller::snapshot::DeviceSnapshot;

/// Observer notified with every published snapshot
pub trait SnapshotConsumer: Send {
    fn on_snapshot(&mut self, snapshot: &DeviceSnapshot);
}

/// Requests applied by the engine between ticks
#[derive(Debug)]
pub enum BinderCommand {
    BeginCapture {
        slot: BindingSlot,
        reply: oneshot::Sender<Result<(), BindingError>>,
    },
    CancelCapture {
        reply: oneshot::Sender<Option<BindingSlot>>,
    },
    SetDelay {
        raw: String,
        reply: oneshot::Sender<u32>,
    },
    SetUseResetMacro {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    SetBreakPollingRate {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    Start {
        reply: oneshot::Sender<Result<RunStatus, BindingError>>,
    },
    Stop {
        reply: oneshot::Sender<RunStatus>,
    },
}

/// Read-only state published after every tick and command
#[derive(Debug, Clone, PartialEq)]
pub struct BinderView {
    pub status: RunStatus,
    pub last_error: Option<String>,
    pub settings: MacroSettings,
    pub capturing: Option<BindingSlot>,
    pub last_capture: Option<CaptureOutcome>,
    pub connection_label: String,
    pub highlights: Vec<MarkerHighlight>,
}

pub struct BinderEngine {
    sampler: DeviceSampler<Sampling>,
    capture: CaptureController,
    store: BindingStore,
    status: RunStatusMachine,
    executor: Box<dyn MacroExecutor>,
    markers: Vec<(Marker, usize)>,
    consumers: Vec<Box<dyn SnapshotConsumer>>,
    latest: Arc<DeviceSnapshot>,
    snapshot_tx: watch::Sender<Arc<DeviceSnapshot>>,
    view_tx: watch::Sender<BinderView>,
    frame_interval: Duration,
}

impl BinderEngine {
    pub fn new(
        sampler: DeviceSampler<Sampling>,
        config: &Config,
        executor: Box<dyn MacroExecutor>,
    ) -> Self {
        info!(
            "Creating binder engine: frame interval {:?}, stop cooldown {:?}",
            config.frame_interval(),
            config.stop_cooldown()
        );

        let latest = Arc::new(DeviceSnapshot::disconnected());
        let (snapshot_tx, _) = watch::channel(latest.clone());

        let mut engine = Self {
            sampler,
            capture: CaptureController::new(),
            store: BindingStore::new(),
            status: RunStatusMachine::new(config.stop_cooldown()),
            executor,
            markers: DEFAULT_MARKERS.to_vec(),
            consumers: Vec::new(),
            latest,
            snapshot_tx,
            view_tx: watch::channel(BinderView::empty()).0,
            frame_interval: config.frame_interval(),
        };
        engine.publish_view();
        engine
    }

    pub fn register_consumer(&mut self, consumer: Box<dyn SnapshotConsumer>) {
        debug!("Registered snapshot consumer #{}", self.consumers.len());
        self.consumers.push(consumer);
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<BinderView> {
        self.view_tx.subscribe()
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn status(&self) -> RunStatus {
        self.status.status()
    }

    /// Runs one sampling tick. Returns true when a hotplug event was seen.
    pub fn tick(&mut self, now: Instant) -> bool {
        let outcome = self.sampler.sample();
        let snapshot = Arc::new(outcome.snapshot);

        match self.capture.on_snapshot(&snapshot, &mut self.store) {
            Ok(Some(button)) => debug!("Tick {} resolved capture: {}", snapshot.tick, button),
            Ok(None) => {}
            Err(e @ BindingError::CaptureAborted { .. }) => debug!("{}", e),
            Err(e) => warn!("Unexpected capture error: {}", e),
        }

        self.status.poll_cooldown(now);

        for consumer in self.consumers.iter_mut() {
            consumer.on_snapshot(&snapshot);
        }

        self.latest = snapshot.clone();
        self.snapshot_tx.send_replace(snapshot);
        self.publish_view();

        outcome.hotplug_seen
    }

    pub fn handle_command(&mut self, command: BinderCommand, now: Instant) {
        debug!("Handling command: {:?}", command);
        // publish before replying
        match command {
            BinderCommand::BeginCapture { slot, reply } => {
                let result = self.capture.begin_capture(slot, &self.latest);
                self.publish_view();
                let _ = reply.send(result);
            }
            BinderCommand::CancelCapture { reply } => {
                let cancelled = self.capture.cancel_capture();
                self.publish_view();
                let _ = reply.send(cancelled);
            }
            BinderCommand::SetDelay { raw, reply } => {
                let delay = self.store.set_delay_input(&raw);
                self.publish_view();
                let _ = reply.send(delay);
            }
            BinderCommand::SetUseResetMacro { enabled, reply } => {
                self.store.set_use_reset_macro(enabled);
                self.publish_view();
                let _ = reply.send(());
            }
            BinderCommand::SetBreakPollingRate { enabled, reply } => {
                self.store.set_break_polling_rate(enabled);
                self.publish_view();
                let _ = reply.send(());
            }
            BinderCommand::Start { reply } => {
                let result = self
                    .status
                    .start(&self.latest, self.store.settings(), self.executor.as_mut())
                    .map(|_| self.status.status());
                self.publish_view();
                let _ = reply.send(result);
            }
            BinderCommand::Stop { reply } => {
                self.status.stop(self.executor.as_mut(), now);
                self.publish_view();
                let _ = reply.send(self.status.status());
            }
        }
    }

    /// Tick loop. Exits when `cancel` fires or every command sender is gone.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<BinderCommand>,
        cancel: CancellationToken,
    ) {
        info!("Starting binder loop");
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Binder loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    // attach/detach is drained and re-enumerated within the same tick
                    if self.tick(Instant::now()) {
                        debug!("Hotplug handled at tick {}", self.latest.tick);
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, Instant::now()),
                    None => {
                        info!("All binder handles dropped, stopping loop");
                        break;
                    }
                },
            }
        }

        self.status.stop(self.executor.as_mut(), Instant::now());
        info!("Binder loop finished after {} ticks", self.sampler.ticks());
    }

    fn publish_view(&mut self) {
        let view = BinderView {
            status: self.status.status(),
            last_error: self.status.last_error().map(str::to_string),
            settings: self.store.settings().clone(),
            capturing: self.capture.active_slot(),
            last_capture: self.capture.last_outcome().cloned(),
            connection_label: visualizer::connection_label(&self.latest),
            highlights: visualizer::highlights(&self.latest, &self.markers),
        };
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

impl BinderView {
    fn empty() -> Self {
        Self {
            status: RunStatus::Ready,
            last_error: None,
            settings: MacroSettings::default(),
            capturing: None,
            last_capture: None,
            connection_label: String::new(),
            highlights: Vec::new(),
        }
    }
}
