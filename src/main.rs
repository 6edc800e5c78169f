pub mod binding;
pub mod config;
pub mod controller;
pub mod engine;

use crate::binding::{BindingSlot, CaptureOutcome, RunStatus, StubExecutor, DEFAULT_MARKERS};
use crate::config::Config;
use crate::controller::{DeviceSampler, DeviceSource, GilrsSource};
use crate::engine::{ActivityLogger, BinderEngine, BinderHandle};
use color_eyre::Result;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = Config::load().await?;
    setup_logging(&config.logging.level);
    info!("Using config {}", Config::path().display());

    let source = GilrsSource::new().map(|source| Box::new(source) as Box<dyn DeviceSource>);
    let sampler = DeviceSampler::create(source).initialize();

    let mut engine = BinderEngine::new(sampler, &config, Box::new(StubExecutor::default()));
    engine.register_consumer(Box::new(ActivityLogger::new(&DEFAULT_MARKERS)));
    let mut handle = BinderHandle::spawn(engine);

    tokio::select! {
        result = run_binding_wizard(&handle, &config) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted during binding");
            handle.cancel_capture().await?;
        }
    }

    if handle.view().status == RunStatus::Running {
        info!("Macro running, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        let status = handle.stop().await?;
        info!("Status: {}", status);
    }

    handle.shutdown().await?;

    let settings = handle.view().settings;
    match toml::to_string_pretty(&settings) {
        Ok(rendered) => info!("Final settings:\n{}", rendered),
        Err(e) => warn!("Unable to render settings: {}", e),
    }
    Ok(())
}

/// Captures EDIT then SELECT, re-arming a capture that was aborted by a
/// disconnect, then optionally starts the macro.
async fn run_binding_wizard(handle: &BinderHandle, config: &Config) -> Result<()> {
    let mut view_rx = handle.subscribe_view();

    for slot in [BindingSlot::Edit, BindingSlot::Select] {
        loop {
            handle.begin_capture(slot).await?;
            info!("Waiting for input: press the controller button for {}", slot);

            let view = view_rx
                .wait_for(|view| view.capturing.is_none())
                .await?
                .clone();
            match view.last_capture {
                Some(CaptureOutcome::Bound { button, .. }) => {
                    info!("{} button set to {}", slot, button);
                    break;
                }
                Some(CaptureOutcome::Aborted { .. }) => {
                    warn!("Controller disconnected while capturing {}, retrying", slot);
                }
                None => {
                    warn!("Capture for {} was cancelled", slot);
                    break;
                }
            }
        }
    }

    if config.wizard.auto_start {
        match handle.start().await {
            Ok(status) => info!("Status: {}", status),
            Err(e) => warn!("Unable to start macro: {}", e),
        }
    }
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

fn setup_logging(configured_level: &str) {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| Level::from_str(&value).ok())
        .or_else(|| Level::from_str(configured_level).ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
