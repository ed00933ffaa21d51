use arcscancore::render::{Scene, VisualizationMode};
use serde::{Deserialize, Serialize};

/// One presented scene as written to the recording file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    pub sequence: usize,
    pub mode: VisualizationMode,
    pub scene: Scene,
}

/// What the bridge saw over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSummary {
    pub arc_scenes: usize,
    pub scatter_scenes: usize,
    pub raw_scenes: usize,
    pub resets: usize,
    pub recorded: usize,
}

impl BridgeSummary {
    pub fn total_scenes(&self) -> usize {
        self.arc_scenes + self.scatter_scenes + self.raw_scenes
    }
}
