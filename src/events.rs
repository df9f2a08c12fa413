use std::fmt;

use crate::grid::CellPos;
use crate::network::NetworkId;
use crate::scripts::ScriptErrorKind;

#[derive(Debug, Clone)]
pub enum CoreEvent {
    NetworkFormed { id: NetworkId, pos: CellPos },
    NetworkRenamed { id: NetworkId, name: String, cells: usize },
    ScriptCompleted { pos: CellPos, output: String },
    ScriptFailed { pos: CellPos, kind: ScriptErrorKind, message: String },
    ScriptMessage { pos: CellPos, message: String },
}

impl fmt::Display for CoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreEvent::NetworkFormed { id, pos } => {
                write!(f, "NetworkFormed id={id} at=({},{})", pos.0, pos.1)
            }
            CoreEvent::NetworkRenamed { id, name, cells } => {
                write!(f, "NetworkRenamed id={id} name={name} cells={cells}")
            }
            CoreEvent::ScriptCompleted { pos, output } => {
                write!(f, "ScriptCompleted at=({},{}) output={output}", pos.0, pos.1)
            }
            CoreEvent::ScriptFailed { pos, kind, message } => {
                write!(f, "ScriptFailed at=({},{}) kind={} message={message}", pos.0, pos.1, kind.label())
            }
            CoreEvent::ScriptMessage { pos, message } => {
                write!(f, "ScriptMessage at=({},{}) {message}", pos.0, pos.1)
            }
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<CoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<CoreEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
