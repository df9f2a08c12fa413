use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, Scope};
use serde::{Deserialize, Serialize};

use crate::grid::{Cell, CellKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptErrorKind {
    Compile,
    Runtime,
    InterpreterUnavailable,
}

impl ScriptErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ScriptErrorKind::Compile => "compile",
            ScriptErrorKind::Runtime => "runtime",
            ScriptErrorKind::InterpreterUnavailable => "interpreter-unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub message: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What a computer cell caches between edits: the last run's value or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOutput {
    Text(String),
    Error(ScriptError),
}

impl ScriptOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScriptOutput::Text(text) => Some(text.as_str()),
            ScriptOutput::Error(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ScriptErrorKind> {
        match self {
            ScriptOutput::Text(_) => None,
            ScriptOutput::Error(err) => Some(err.kind),
        }
    }
}

impl fmt::Display for ScriptOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptOutput::Text(text) => write!(f, "{text}"),
            ScriptOutput::Error(err) => write!(f, "{err}"),
        }
    }
}

/// Resource ceiling for one script run. `max_operations` of 0 lifts the
/// operation ceiling; a zero `timeout` lifts the wall-clock one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptBudget {
    pub max_operations: u64,
    pub timeout: Duration,
}

impl Default for ScriptBudget {
    fn default() -> Self {
        Self { max_operations: 100_000, timeout: Duration::from_millis(100) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub output: ScriptOutput,
    /// Lines the script wrote via `print`/`debug`, in order.
    pub prints: Vec<String>,
}

/// Replaces a computer cell's source and unconditionally marks it dirty.
/// An edit always forces re-execution, even when the text is unchanged.
pub fn set_source(cell: &mut Cell, text: impl Into<String>) {
    cell.source = text.into();
    if cell.kind == CellKind::Computer {
        cell.dirty = true;
    }
}

/// Runs dirty computer cells, one fresh interpreter per call.
///
/// Nothing persists between runs: each execution gets its own engine with a
/// clean standard library, bounded by the configured budget, and the engine
/// is dropped before the call returns whatever the outcome was.
pub struct ScriptRuntime {
    budget: ScriptBudget,
    unavailable: Option<String>,
}

impl ScriptRuntime {
    pub fn new(budget: ScriptBudget) -> Self {
        Self { budget, unavailable: None }
    }

    pub fn budget(&self) -> ScriptBudget {
        self.budget
    }

    /// Marks the scripting backend as failed to initialize. Executions keep
    /// consuming dirty flags but report the failure instead of running.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.unavailable = Some(reason.into());
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    /// Executes a dirty computer cell once. Clean cells and non-computers
    /// are a no-op. The dirty flag is consumed on every branch, so a cell
    /// runs at most once per edit.
    pub fn execute(&self, cell: &mut Cell) -> Option<ExecutionReport> {
        if cell.kind != CellKind::Computer || !cell.dirty {
            return None;
        }
        let report = match &self.unavailable {
            Some(reason) => ExecutionReport {
                output: ScriptOutput::Error(ScriptError {
                    kind: ScriptErrorKind::InterpreterUnavailable,
                    message: format!("interpreter unavailable: {reason}"),
                }),
                prints: Vec::new(),
            },
            None => self.run_source(&cell.source),
        };
        cell.output = Some(report.output.clone());
        cell.dirty = false;
        Some(report)
    }

    fn run_source(&self, source: &str) -> ExecutionReport {
        let prints: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let engine = self.acquire_engine(Rc::clone(&prints));
        let output = match engine.compile(source) {
            Err(err) => ScriptOutput::Error(ScriptError {
                kind: ScriptErrorKind::Compile,
                message: format!("syntax error: {err}"),
            }),
            Ok(ast) => {
                let mut scope = Scope::new();
                match engine.eval_ast_with_scope::<Dynamic>(&mut scope, &ast) {
                    Err(err) => ScriptOutput::Error(ScriptError {
                        kind: ScriptErrorKind::Runtime,
                        message: format!("runtime error: {err}"),
                    }),
                    Ok(value) if value.is::<()>() => ScriptOutput::Text("(no return)".to_string()),
                    Ok(value) => ScriptOutput::Text(value.to_string()),
                }
            }
        };
        drop(engine);
        let prints = prints.take();
        ExecutionReport { output, prints }
    }

    fn acquire_engine(&self, prints: Rc<RefCell<Vec<String>>>) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(self.budget.max_operations);
        if !self.budget.timeout.is_zero() {
            let deadline = Instant::now() + self.budget.timeout;
            engine.on_progress(move |_| {
                if Instant::now() >= deadline {
                    Some("time budget exceeded".into())
                } else {
                    None
                }
            });
        }
        let sink = Rc::clone(&prints);
        engine.on_print(move |line| sink.borrow_mut().push(line.to_string()));
        engine.on_debug(move |line, _, _| prints.borrow_mut().push(line.to_string()));
        engine
    }
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new(ScriptBudget::default())
    }
}
