use crate::grid::{CellKind, CellPos, Grid};
use crate::scripts::ScriptOutput;

/// The cached output a peripheral cell should render: the first adjacent
/// computer's output in probe order. Pure read, no grid mutation.
pub fn adjacent_output(grid: &Grid, pos: CellPos) -> Option<&ScriptOutput> {
    grid.cell(pos).filter(|cell| cell.kind == CellKind::Peripheral)?;
    for neighbor in grid.neighbors4(pos) {
        if let Some(cell) = grid.cell(neighbor) {
            if cell.kind == CellKind::Computer {
                if let Some(output) = cell.output.as_ref() {
                    return Some(output);
                }
            }
        }
    }
    None
}

/// Fills a `size`-by-`size` block of peripheral cells, starting one column
/// right of the anchor, skipping occupied positions. Returns how many cells
/// were created.
pub fn spawn_screen_block(grid: &mut Grid, anchor: CellPos, size: u32) -> usize {
    let size = size.max(1) as i32;
    let mut created = 0;
    for dy in 0..size {
        for dx in 0..size {
            let pos = (anchor.0 + 1 + dx, anchor.1 + dy);
            if grid.is_empty(pos) && grid.create_cell(CellKind::Peripheral, pos) {
                created += 1;
            }
        }
    }
    created
}
