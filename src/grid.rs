use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::network::NetworkId;
use crate::scripts::ScriptOutput;

pub type CellPos = (i32, i32);

/// Neighbor probe order. Reconcile tie-breaks depend on this staying fixed.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Computer,
    Conductor,
    Peripheral,
    Other(String),
}

impl CellKind {
    pub fn is_networked(&self) -> bool {
        matches!(self, CellKind::Computer | CellKind::Conductor | CellKind::Peripheral)
    }

    pub fn label(&self) -> &str {
        match self {
            CellKind::Computer => "computer",
            CellKind::Conductor => "conductor",
            CellKind::Peripheral => "peripheral",
            CellKind::Other(tag) => tag.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    pub output: Option<ScriptOutput>,
    pub dirty: bool,
    pub network_id: Option<NetworkId>,
    pub display_name: Option<String>,
}

impl Cell {
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            source: String::new(),
            output: None,
            dirty: false,
            network_id: None,
            display_name: None,
        }
    }

    pub fn with_source(kind: CellKind, source: impl Into<String>, dirty: bool) -> Self {
        Self { source: source.into(), dirty, ..Self::new(kind) }
    }

    pub fn is_networked(&self) -> bool {
        self.kind.is_networked()
    }
}

/// Sparse cell store. Owns every cell; positions without an entry are empty.
#[derive(Debug, Default)]
pub struct Grid {
    cells: HashMap<CellPos, Cell>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self, pos: CellPos) -> bool {
        !self.cells.contains_key(&pos)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Places a cell if the position is empty. Returns false without
    /// touching an existing occupant.
    pub fn create_cell(&mut self, kind: CellKind, pos: CellPos) -> bool {
        self.insert_cell(pos, Cell::new(kind))
    }

    pub fn insert_cell(&mut self, pos: CellPos, cell: Cell) -> bool {
        if self.cells.contains_key(&pos) {
            return false;
        }
        self.cells.insert(pos, cell);
        true
    }

    pub fn remove_cell(&mut self, pos: CellPos) -> Option<Cell> {
        self.cells.remove(&pos)
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    pub fn cell_mut(&mut self, pos: CellPos) -> Option<&mut Cell> {
        self.cells.get_mut(&pos)
    }

    /// Occupied neighbor positions in probe order.
    pub fn neighbors4(&self, pos: CellPos) -> SmallVec<[CellPos; 4]> {
        let mut found = SmallVec::new();
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let candidate = (pos.0 + dx, pos.1 + dy);
            if self.cells.contains_key(&candidate) {
                found.push(candidate);
            }
        }
        found
    }

    /// Full-grid scan order for a tick: row-major, ascending y then x.
    pub fn scan_positions(&self) -> Vec<CellPos> {
        let mut positions: Vec<CellPos> = self.cells.keys().copied().collect();
        positions.sort_by_key(|&(x, y)| (y, x));
        positions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellPos, &Cell)> {
        self.cells.iter()
    }
}
