use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::grid::{Cell, CellKind, Grid};
use crate::network::NetworkId;
use crate::scripts::ScriptOutput;

/// Serialized form of one grid. Cells are stored in scan order so saved
/// files diff cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GridScene {
    #[serde(default)]
    pub cells: Vec<SceneCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneCell {
    pub x: i32,
    pub y: i32,
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<NetworkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ScriptOutput>,
}

impl GridScene {
    pub fn capture(grid: &Grid) -> Self {
        let cells = grid
            .scan_positions()
            .into_iter()
            .filter_map(|pos| {
                grid.cell(pos).map(|cell| SceneCell {
                    x: pos.0,
                    y: pos.1,
                    kind: cell.kind.clone(),
                    source: cell.source.clone(),
                    network_id: cell.network_id,
                    display_name: cell.display_name.clone(),
                    output: cell.output.clone(),
                })
            })
            .collect();
        Self { cells }
    }

    /// Rebuilds a grid from the scene. The dirty flag is not persisted, so
    /// every computer comes back dirty and re-runs on the next tick.
    pub fn restore(&self) -> Grid {
        let mut grid = Grid::new();
        for saved in &self.cells {
            let mut cell = Cell::new(saved.kind.clone());
            cell.source = saved.source.clone();
            cell.network_id = saved.network_id;
            cell.display_name = saved.display_name.clone();
            cell.output = saved.output.clone();
            cell.dirty = saved.kind == CellKind::Computer;
            grid.insert_cell((saved.x, saved.y), cell);
        }
        grid
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading scene file {}", path.display()))?;
        let scene = serde_json::from_slice::<GridScene>(&bytes)
            .with_context(|| format!("Parsing scene file {}", path.display()))?;
        Ok(scene)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating scene directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing scene file {}", path.display()))?;
        Ok(())
    }
}
