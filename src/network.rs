use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::grid::{CellPos, Grid};

/// Opaque label shared by every cell of one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(u64);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net{}", self.0)
    }
}

/// Fresh-id source owned by the tick driver and passed into reconcile.
#[derive(Debug)]
pub struct NetworkIdAllocator {
    next: u64,
}

impl NetworkIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> NetworkId {
        let id = NetworkId(self.next);
        self.next += 1;
        id
    }
}

impl Default for NetworkIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub id: NetworkId,
    /// True when the id was freshly allocated rather than adopted.
    pub fresh: bool,
}

/// Settles one cell's network id against its 4-neighborhood.
///
/// The first neighbor in probe order that already carries an id wins the
/// tie-break for this tick; a cell with no id and no labeled neighbor gets a
/// fresh one. The resolved id is then pushed onto every networked neighbor
/// that still lacks one. Ids spread at most one hop per tick along the scan,
/// so large components settle over several ticks.
pub fn reconcile(
    grid: &mut Grid,
    pos: CellPos,
    allocator: &mut NetworkIdAllocator,
) -> Option<ReconcileOutcome> {
    let current = match grid.cell(pos) {
        Some(cell) if cell.is_networked() => cell.network_id,
        _ => return None,
    };

    let neighbors: SmallVec<[CellPos; 4]> = grid
        .neighbors4(pos)
        .into_iter()
        .filter(|&n| grid.cell(n).is_some_and(|c| c.is_networked()))
        .collect();

    let incoming = neighbors.iter().find_map(|&n| grid.cell(n).and_then(|c| c.network_id));
    let (id, fresh) = match incoming.or(current) {
        Some(id) => (id, false),
        None => (allocator.allocate(), true),
    };

    if let Some(cell) = grid.cell_mut(pos) {
        cell.network_id = Some(id);
    }
    for n in neighbors {
        if let Some(cell) = grid.cell_mut(n) {
            if cell.network_id.is_none() {
                cell.network_id = Some(id);
            }
        }
    }

    Some(ReconcileOutcome { id, fresh })
}

/// Relabels the whole network the seed cell belongs to.
///
/// Walks only 4-adjacent networked cells carrying the seed's id, so cells of
/// other networks are never touched even when they sit next to members.
/// An empty or whitespace-only name is a silent no-op. Returns how many
/// cells were relabeled.
pub fn rename(grid: &mut Grid, pos: CellPos, new_name: &str) -> usize {
    if new_name.trim().is_empty() {
        return 0;
    }
    let seed_id = match grid.cell(pos) {
        Some(cell) if cell.is_networked() => match cell.network_id {
            Some(id) => id,
            None => return 0,
        },
        _ => return 0,
    };

    let mut visited: HashSet<CellPos> = HashSet::new();
    let mut queue: VecDeque<CellPos> = VecDeque::new();
    visited.insert(pos);
    queue.push_back(pos);
    let mut relabeled = 0;

    while let Some(at) = queue.pop_front() {
        if let Some(cell) = grid.cell_mut(at) {
            cell.display_name = Some(new_name.to_string());
            relabeled += 1;
        }
        for n in grid.neighbors4(at) {
            if visited.contains(&n) {
                continue;
            }
            let member = grid
                .cell(n)
                .is_some_and(|c| c.is_networked() && c.network_id == Some(seed_id));
            if member {
                visited.insert(n);
                queue.push_back(n);
            }
        }
    }

    relabeled
}
