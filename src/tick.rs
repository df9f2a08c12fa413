use std::time::Duration;

use crate::config::EngineConfig;
use crate::events::{CoreEvent, EventBus};
use crate::grid::{Cell, CellKind, CellPos, Grid};
use crate::network::{self, NetworkIdAllocator};
use crate::scripts::{ScriptBudget, ScriptOutput, ScriptRuntime, set_source};

/// Drives the grid one step at a time: reconcile network ids in scan order,
/// then run whichever computers an edit left dirty.
///
/// The driver owns the grid's only mutable pass, so within one tick a cell
/// reads already-visited neighbors as of this tick and the rest as of the
/// previous one. That asymmetry is what lets ids spread hop by hop.
pub struct TickDriver {
    config: EngineConfig,
    allocator: NetworkIdAllocator,
    runtime: ScriptRuntime,
    ticks: u64,
}

impl TickDriver {
    pub fn new(config: EngineConfig) -> Self {
        let budget = ScriptBudget {
            max_operations: config.script.max_operations,
            timeout: Duration::from_millis(config.script.timeout_ms),
        };
        Self {
            config,
            allocator: NetworkIdAllocator::new(),
            runtime: ScriptRuntime::new(budget),
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runtime_mut(&mut self) -> &mut ScriptRuntime {
        &mut self.runtime
    }

    /// Host-facing cell creation. Computers pick up the configured default
    /// source; whether that source runs without an explicit edit is also a
    /// config decision.
    pub fn create_cell(&self, grid: &mut Grid, kind: CellKind, pos: CellPos) -> bool {
        let cell = match kind {
            CellKind::Computer => {
                let source = self.config.script.default_source.clone();
                let dirty = self.config.script.run_default_source && !source.is_empty();
                Cell::with_source(CellKind::Computer, source, dirty)
            }
            other => Cell::new(other),
        };
        grid.insert_cell(pos, cell)
    }

    /// UI entry point for edits.
    pub fn edit_source(&self, grid: &mut Grid, pos: CellPos, text: impl Into<String>) -> bool {
        match grid.cell_mut(pos) {
            Some(cell) if cell.kind == CellKind::Computer => {
                set_source(cell, text);
                true
            }
            _ => false,
        }
    }

    /// UI entry point for renames. Completes before returning, so the next
    /// tick never observes a half-renamed network.
    pub fn rename_network(
        &self,
        grid: &mut Grid,
        pos: CellPos,
        name: &str,
        events: &mut EventBus,
    ) -> usize {
        let relabeled = network::rename(grid, pos, name);
        if relabeled > 0 {
            if let Some(id) = grid.cell(pos).and_then(|c| c.network_id) {
                events.push(CoreEvent::NetworkRenamed {
                    id,
                    name: name.to_string(),
                    cells: relabeled,
                });
            }
        }
        relabeled
    }

    pub fn tick(&mut self, grid: &mut Grid, events: &mut EventBus) {
        for pos in grid.scan_positions() {
            if let Some(outcome) = network::reconcile(grid, pos, &mut self.allocator) {
                if outcome.fresh {
                    events.push(CoreEvent::NetworkFormed { id: outcome.id, pos });
                }
            }
            if let Some(cell) = grid.cell_mut(pos) {
                if let Some(report) = self.runtime.execute(cell) {
                    for message in report.prints {
                        events.push(CoreEvent::ScriptMessage { pos, message });
                    }
                    match report.output {
                        ScriptOutput::Text(output) => {
                            events.push(CoreEvent::ScriptCompleted { pos, output });
                        }
                        ScriptOutput::Error(err) => {
                            events.push(CoreEvent::ScriptFailed {
                                pos,
                                kind: err.kind,
                                message: err.message,
                            });
                        }
                    }
                }
            }
        }
        self.ticks += 1;
    }

    /// Runs `count` ticks back to back, draining nothing; callers that care
    /// about events can drain between single ticks instead.
    pub fn run_ticks(&mut self, grid: &mut Grid, events: &mut EventBus, count: u64) {
        for _ in 0..count {
            self.tick(grid, events);
        }
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
