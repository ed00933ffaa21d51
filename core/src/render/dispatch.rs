use crate::arena::ArenaBounds;
use crate::device::{FetchKind, ScanFrame};
use crate::prelude::{ScanError, ScanResult};
use crate::render::scene::Scene;
use crate::render::surface::RenderSurface;
use crate::transform::{arc_scene, raw_scene, scatter_scene};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    #[default]
    Arc,
    #[serde(rename = "scatter3d")]
    Scatter3D,
    RawHeatmap,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 3] = [
        VisualizationMode::Arc,
        VisualizationMode::Scatter3D,
        VisualizationMode::RawHeatmap,
    ];

    /// Data the mode needs from each poll cycle.
    pub fn fetch_kind(self) -> FetchKind {
        match self {
            VisualizationMode::Arc | VisualizationMode::Scatter3D => FetchKind::Targets,
            VisualizationMode::RawHeatmap => FetchKind::RawSlice,
        }
    }
}

impl FromStr for VisualizationMode {
    type Err = ScanError;

    fn from_str(s: &str) -> ScanResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "arc" | "2d" => Ok(VisualizationMode::Arc),
            "scatter3d" | "3d" => Ok(VisualizationMode::Scatter3D),
            "raw_heatmap" | "raw" => Ok(VisualizationMode::RawHeatmap),
            _ => Err(ScanError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VisualizationMode::Arc => "arc",
            VisualizationMode::Scatter3D => "scatter3d",
            VisualizationMode::RawHeatmap => "raw_heatmap",
        };
        f.write_str(name)
    }
}

/// One surface per visualization mode.
pub struct SurfaceSet<S> {
    pub arc: S,
    pub scatter: S,
    pub raw: S,
}

impl<S> SurfaceSet<S> {
    pub fn get(&self, mode: VisualizationMode) -> &S {
        match mode {
            VisualizationMode::Arc => &self.arc,
            VisualizationMode::Scatter3D => &self.scatter,
            VisualizationMode::RawHeatmap => &self.raw,
        }
    }

    pub fn get_mut(&mut self, mode: VisualizationMode) -> &mut S {
        match mode {
            VisualizationMode::Arc => &mut self.arc,
            VisualizationMode::Scatter3D => &mut self.scatter,
            VisualizationMode::RawHeatmap => &mut self.raw,
        }
    }
}

/// Routes each cycle's frame through the active mode's transform to its surface.
///
/// Only the active surface is visible. Inactive surfaces keep whatever they
/// last showed until their mode comes back.
pub struct RenderDispatch<S: RenderSurface> {
    mode: VisualizationMode,
    surfaces: SurfaceSet<S>,
}

impl<S: RenderSurface> RenderDispatch<S> {
    pub fn new(mut surfaces: SurfaceSet<S>) -> Self {
        let mode = VisualizationMode::default();
        for other in VisualizationMode::ALL {
            surfaces.get_mut(other).set_visible(other == mode);
        }
        Self { mode, surfaces }
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    pub fn surface(&self, mode: VisualizationMode) -> &S {
        self.surfaces.get(mode)
    }

    pub fn surface_mut(&mut self, mode: VisualizationMode) -> &mut S {
        self.surfaces.get_mut(mode)
    }

    /// Switches the visible surface. While idle the new surface is blanked
    /// right away; while scanning it is left for the next cycle to repaint.
    /// Returns whether the surface was reset.
    pub fn set_mode(&mut self, mode: VisualizationMode, scanning: bool) -> bool {
        self.mode = mode;
        for other in VisualizationMode::ALL {
            self.surfaces.get_mut(other).set_visible(other == mode);
        }
        if scanning {
            return false;
        }
        self.surfaces.get_mut(mode).reset();
        true
    }

    /// Renders a frame for the active mode. A frame fetched for a different
    /// kind of data (the mode changed mid-cycle) is dropped and `false`
    /// returned.
    pub fn render(&mut self, frame: ScanFrame, bounds: &ArenaBounds) -> bool {
        let mode = self.mode;
        let surface = self.surfaces.get_mut(mode);
        let scene = match (mode, frame) {
            (VisualizationMode::Arc, ScanFrame::Targets(targets)) => {
                Scene::Arc(arc_scene(&targets, bounds, surface.viewport()))
            }
            (VisualizationMode::Scatter3D, ScanFrame::Targets(targets)) => {
                Scene::Scatter(scatter_scene(&targets, bounds))
            }
            (VisualizationMode::RawHeatmap, ScanFrame::Raw(slice)) => {
                Scene::Raw(raw_scene(&slice))
            }
            _ => return false,
        };
        surface.present(scene);
        true
    }
}
