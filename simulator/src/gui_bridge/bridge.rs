use crate::gui_bridge::model::{BridgeSummary, SceneRecord};
use anyhow::{Context, Result};
use arcscancore::render::{
    ArcPrimitive, RawScene, RenderSurface, Scene, SurfaceSet, Viewport, VisualizationMode,
};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Collects scenes from all three surfaces and optionally appends them to a
/// JSON-lines file.
pub struct SceneSink {
    writer: Option<BufWriter<File>>,
    summary: BridgeSummary,
}

impl SceneSink {
    pub fn new() -> Self {
        Self {
            writer: None,
            summary: BridgeSummary::default(),
        }
    }

    pub fn recording_to<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("creating scene recording {}", path.display()))?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            summary: BridgeSummary::default(),
        })
    }

    pub fn summary(&self) -> BridgeSummary {
        self.summary
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().context("flushing scene recording")?;
        }
        Ok(())
    }

    fn record(&mut self, mode: VisualizationMode, scene: Scene) {
        match mode {
            VisualizationMode::Arc => self.summary.arc_scenes += 1,
            VisualizationMode::Scatter3D => self.summary.scatter_scenes += 1,
            VisualizationMode::RawHeatmap => self.summary.raw_scenes += 1,
        }
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let record = SceneRecord {
            sequence: self.summary.recorded,
            mode,
            scene,
        };
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(anyhow::Error::from)
            .and_then(|_| writer.write_all(b"\n").map_err(anyhow::Error::from));
        match written {
            Ok(()) => self.summary.recorded += 1,
            Err(err) => warn!("dropping {} scene from recording: {}", mode, err),
        }
    }
}

impl Default for SceneSink {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSink = Arc<Mutex<SceneSink>>;

/// Stand-in for a window panel: reports each scene to the log and the sink.
pub struct BridgeSurface {
    mode: VisualizationMode,
    viewport: Viewport,
    sink: SharedSink,
}

impl BridgeSurface {
    pub fn new(mode: VisualizationMode, viewport: Viewport, sink: SharedSink) -> Self {
        Self {
            mode,
            viewport,
            sink,
        }
    }
}

fn describe(scene: &Scene) -> String {
    match scene {
        Scene::Arc(arc) => {
            let markers: Vec<String> = arc
                .primitives
                .iter()
                .filter_map(|p| match p {
                    ArcPrimitive::Marker { center, .. } => {
                        Some(format!("({:.0},{:.0})", center.x, center.y))
                    }
                    _ => None,
                })
                .collect();
            format!("{} targets {}", markers.len(), markers.join(" "))
        }
        Scene::Scatter(scatter) => format!("{} points", scatter.points.len()),
        Scene::Raw(RawScene::Grid { data, min, max, .. }) => {
            let (rows, cols) = data.dim();
            format!("{}x{} grid, intensity {:.3}..{:.3}", rows, cols, min, max)
        }
        Scene::Raw(RawScene::Line { samples, .. }) => {
            format!("{} samples as line", samples.len())
        }
    }
}

impl RenderSurface for BridgeSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, scene: Scene) {
        info!("[{}] {}", self.mode, describe(&scene));
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.record(self.mode, scene);
    }

    fn reset(&mut self) {
        debug!("[{}] reset", self.mode);
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.summary.resets += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        if visible {
            debug!("[{}] shown", self.mode);
        }
    }
}

pub fn bridge_surfaces(viewport: Viewport, sink: &SharedSink) -> SurfaceSet<BridgeSurface> {
    SurfaceSet {
        arc: BridgeSurface::new(VisualizationMode::Arc, viewport, sink.clone()),
        scatter: BridgeSurface::new(VisualizationMode::Scatter3D, viewport, sink.clone()),
        raw: BridgeSurface::new(VisualizationMode::RawHeatmap, viewport, sink.clone()),
    }
}
