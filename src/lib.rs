pub mod config;
pub mod display;
pub mod events;
pub mod grid;
pub mod network;
pub mod scene;
pub mod scripts;
pub mod tick;

pub use config::EngineConfig;
pub use events::{CoreEvent, EventBus};
pub use grid::{Cell, CellKind, CellPos, Grid};
pub use network::{NetworkId, NetworkIdAllocator};
pub use scene::GridScene;
pub use scripts::{ScriptBudget, ScriptError, ScriptErrorKind, ScriptOutput, ScriptRuntime};
pub use tick::TickDriver;
