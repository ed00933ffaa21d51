use crate::generator::sensor::SimulatedDevice;
use crate::gui_bridge::bridge::{bridge_surfaces, BridgeSurface, SceneSink, SharedSink};
use crate::gui_bridge::model::BridgeSummary;
use crate::workflow::config::ScanConfig;
use anyhow::Context;
use arcscancore::device::SessionState;
use arcscancore::telemetry::MetricsSnapshot;
use arcscancore::ScanController;
use log::{info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::signal;

type SimController = ScanController<SimulatedDevice, BridgeSurface>;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metrics: MetricsSnapshot,
    pub bridge: BridgeSummary,
    pub final_state: SessionState,
    pub interrupted: bool,
    pub last_status: Option<String>,
}

#[derive(Clone)]
pub struct Runner {
    config: ScanConfig,
    record: Option<PathBuf>,
}

impl Runner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            record: None,
        }
    }

    /// Also write every presented scene to `path` as JSON lines.
    pub fn with_recording(mut self, path: PathBuf) -> Self {
        self.record = Some(path);
        self
    }

    /// Runs until the configured number of cycles or Ctrl+C, whichever
    /// comes first.
    pub async fn execute(&self) -> anyhow::Result<RunSummary> {
        self.execute_until(async {
            if let Err(err) = signal::ctrl_c().await {
                warn!("cannot listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    pub async fn execute_until<I>(&self, interrupt: I) -> anyhow::Result<RunSummary>
    where
        I: Future<Output = ()>,
    {
        let sink = match &self.record {
            Some(path) => SceneSink::recording_to(path)?,
            None => SceneSink::new(),
        };
        let sink: SharedSink = Arc::new(Mutex::new(sink));
        let mut controller = self.build_controller(&sink)?;

        controller.start().context("starting scan")?;
        info!(
            "running {} cycles every {} ms in {} view",
            self.config.cycles, self.config.interval_ms, self.config.mode
        );

        let interval = self.config.controller_options().poll_interval;
        let interrupted = tokio::select! {
            _ = wait_for_cycles(&controller, self.config.cycles, interval) => false,
            _ = interrupt => true,
        };
        if interrupted {
            info!("interrupted; shutting down");
        }
        controller.shutdown();

        let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.flush()?;
        Ok(RunSummary {
            metrics: controller.metrics(),
            bridge: sink.summary(),
            final_state: controller.session_state(),
            interrupted,
            last_status: controller.logger().last(),
        })
    }

    fn build_controller(&self, sink: &SharedSink) -> anyhow::Result<SimController> {
        let config = &self.config;
        let device = SimulatedDevice::new(config.sensor.clone());
        let surfaces = bridge_surfaces(config.viewport(), sink);
        let mut controller = ScanController::new(device, surfaces, config.controller_options());

        controller.select_profile(config.profile)?;
        controller.select_filter(config.filter)?;
        if let Some(bounds) = config.bounds {
            controller.set_bounds(bounds)?;
        }
        controller.set_mode(config.mode);
        Ok(controller)
    }
}

async fn wait_for_cycles(controller: &SimController, cycles: usize, interval: Duration) {
    loop {
        let metrics = controller.metrics();
        if metrics.cycles + metrics.cycle_errors >= cycles || !controller.is_scanning() {
            return;
        }
        tokio::time::sleep(interval).await;
    }
}
