//! Public handle for the binder engine
//!
//! Every request is sent over the command channel and answered through a
//! oneshot, so it is applied between two ticks of the engine loop and never
//! races a capture resolution.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::binding::{BindingSlot, RunStatus};
use crate::controller::snapshot::DeviceSnapshot;
use crate::engine::binder_engine::{BinderCommand, BinderEngine, BinderView};
use crate::engine::EngineError;

const COMMAND_BUFFER: usize = 32;

pub struct BinderHandle {
    command_tx: mpsc::Sender<BinderCommand>,
    snapshot_rx: watch::Receiver<Arc<DeviceSnapshot>>,
    view_rx: watch::Receiver<BinderView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl BinderHandle {
    /// Spawns the engine loop on the current tokio runtime.
    pub fn spawn(engine: BinderEngine) -> Self {
        info!(
            "Spawning binder engine with {:?} frame interval",
            engine.frame_interval()
        );
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let snapshot_rx = engine.subscribe_snapshots();
        let view_rx = engine.subscribe_view();
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            engine.run(command_rx, loop_cancel).await;
        });

        Self {
            command_tx,
            snapshot_rx,
            view_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> BinderCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx.send(build(reply_tx)).await.map_err(|_| {
            error!("Failed to send command: binder loop is gone");
            EngineError::ChannelError("binder loop is not running".to_string())
        })?;
        reply_rx
            .await
            .map_err(|_| EngineError::ChannelError("binder loop dropped the reply".to_string()))
    }

    pub async fn begin_capture(&self, slot: BindingSlot) -> Result<(), EngineError> {
        self.request(|reply| BinderCommand::BeginCapture { slot, reply })
            .await??;
        Ok(())
    }

    pub async fn cancel_capture(&self) -> Result<Option<BindingSlot>, EngineError> {
        self.request(|reply| BinderCommand::CancelCapture { reply })
            .await
    }

    pub async fn set_delay(&self, raw: impl Into<String>) -> Result<u32, EngineError> {
        let raw = raw.into();
        self.request(|reply| BinderCommand::SetDelay { raw, reply })
            .await
    }

    pub async fn set_use_reset_macro(&self, enabled: bool) -> Result<(), EngineError> {
        self.request(|reply| BinderCommand::SetUseResetMacro { enabled, reply })
            .await
    }

    pub async fn set_break_polling_rate(&self, enabled: bool) -> Result<(), EngineError> {
        self.request(|reply| BinderCommand::SetBreakPollingRate { enabled, reply })
            .await
    }

    pub async fn start(&self) -> Result<RunStatus, EngineError> {
        Ok(self.request(|reply| BinderCommand::Start { reply }).await??)
    }

    pub async fn stop(&self) -> Result<RunStatus, EngineError> {
        self.request(|reply| BinderCommand::Stop { reply }).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn view(&self) -> BinderView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<BinderView> {
        self.view_rx.clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Cancels the loop and waits for the in-flight tick to finish.
    /// Calling it again is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => {
                task.await
                    .map_err(|e| EngineError::TaskError(e.to_string()))?;
                info!("Binder engine shut down");
            }
            None => debug!("Binder engine already shut down"),
        }
        Ok(())
    }
}

impl Drop for BinderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
