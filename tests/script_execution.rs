use conduit_engine::config::{EngineConfig, ScriptConfig};
use conduit_engine::events::{CoreEvent, EventBus};
use conduit_engine::grid::{CellKind, CellPos, Grid};
use conduit_engine::scripts::{ScriptErrorKind, ScriptOutput};
use conduit_engine::tick::TickDriver;

const COMPUTER: CellPos = (0, 0);

fn driver_with_script(script: ScriptConfig) -> TickDriver {
    TickDriver::new(EngineConfig { script })
}

fn computer_grid(driver: &TickDriver, source: &str) -> Grid {
    let mut grid = Grid::new();
    assert!(driver.create_cell(&mut grid, CellKind::Computer, COMPUTER));
    assert!(driver.edit_source(&mut grid, COMPUTER, source));
    grid
}

fn output_of(grid: &Grid) -> ScriptOutput {
    grid.cell(COMPUTER)
        .and_then(|cell| cell.output.clone())
        .expect("computer should have cached output")
}

fn dirty(grid: &Grid) -> bool {
    grid.cell(COMPUTER).expect("computer cell").dirty
}

#[test]
fn string_expression_caches_its_text() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, r#""Hello!""#);
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    assert_eq!(output_of(&grid), ScriptOutput::Text("Hello!".to_string()));
    assert!(!dirty(&grid));
    assert!(
        events.drain().iter().any(|event| matches!(
            event,
            CoreEvent::ScriptCompleted { output, .. } if output == "Hello!"
        )),
        "completion should be announced with the output"
    );
}

#[test]
fn statement_only_script_reports_no_return() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, "let total = 2 + 2;");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    assert_eq!(output_of(&grid), ScriptOutput::Text("(no return)".to_string()));
}

#[test]
fn unbalanced_source_is_a_compile_error_and_consumes_the_edit() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, "if true {");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    match output_of(&grid) {
        ScriptOutput::Error(err) => {
            assert_eq!(err.kind, ScriptErrorKind::Compile);
            assert!(err.message.starts_with("syntax error:"), "got: {}", err.message);
        }
        other => panic!("expected compile error, got {other:?}"),
    }
    assert!(!dirty(&grid), "a failed run still consumes the dirty flag");
    assert!(events
        .drain()
        .iter()
        .any(|event| matches!(event, CoreEvent::ScriptFailed { kind: ScriptErrorKind::Compile, .. })));
}

#[test]
fn unknown_function_is_a_runtime_error() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, "definitely_not_builtin()");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    match output_of(&grid) {
        ScriptOutput::Error(err) => {
            assert_eq!(err.kind, ScriptErrorKind::Runtime);
            assert!(err.message.starts_with("runtime error:"), "got: {}", err.message);
        }
        other => panic!("expected runtime error, got {other:?}"),
    }
}

#[test]
fn infinite_loop_is_cut_off_by_the_operation_budget() {
    let mut driver = driver_with_script(ScriptConfig {
        max_operations: 10_000,
        timeout_ms: 0,
        ..ScriptConfig::default()
    });
    let mut grid = computer_grid(&driver, "loop { }");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    assert_eq!(output_of(&grid).error_kind(), Some(ScriptErrorKind::Runtime));
    assert!(!dirty(&grid), "budget exhaustion still settles the cell");
}

#[test]
fn runaway_script_is_cut_off_by_the_wall_clock_budget() {
    let mut driver = driver_with_script(ScriptConfig {
        max_operations: 0,
        timeout_ms: 25,
        ..ScriptConfig::default()
    });
    let mut grid = computer_grid(&driver, "loop { }");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    assert_eq!(output_of(&grid).error_kind(), Some(ScriptErrorKind::Runtime));
}

#[test]
fn edit_always_forces_a_rerun() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, "1 + 1");
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);
    assert_eq!(output_of(&grid), ScriptOutput::Text("2".to_string()));

    driver.tick(&mut grid, &mut events);
    assert_eq!(output_of(&grid), ScriptOutput::Text("2".to_string()), "clean cell stays untouched");

    assert!(driver.edit_source(&mut grid, COMPUTER, "2 + 2"));
    driver.tick(&mut grid, &mut events);
    assert_eq!(output_of(&grid), ScriptOutput::Text("4".to_string()));
}

#[test]
fn prints_surface_as_script_message_events() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, r#"print("probe"); 7"#);
    let mut events = EventBus::new();

    driver.tick(&mut grid, &mut events);

    let drained = events.drain();
    assert!(drained.iter().any(|event| matches!(
        event,
        CoreEvent::ScriptMessage { message, .. } if message == "probe"
    )));
    assert_eq!(output_of(&grid), ScriptOutput::Text("7".to_string()));
}

#[test]
fn unavailable_interpreter_reports_once_until_the_next_edit() {
    let mut driver = TickDriver::default();
    let mut grid = computer_grid(&driver, r#""Hello!""#);
    let mut events = EventBus::new();
    driver.runtime_mut().mark_unavailable("scripting backend not loaded");

    driver.tick(&mut grid, &mut events);
    match output_of(&grid) {
        ScriptOutput::Error(err) => {
            assert_eq!(err.kind, ScriptErrorKind::InterpreterUnavailable);
            assert!(err.message.contains("scripting backend not loaded"));
        }
        other => panic!("expected unavailable error, got {other:?}"),
    }
    assert!(!dirty(&grid));
    events.drain();

    driver.tick(&mut grid, &mut events);
    assert!(
        !events.drain().iter().any(|event| matches!(event, CoreEvent::ScriptFailed { .. })),
        "clean cell must not re-report the unavailable backend"
    );

    assert!(driver.edit_source(&mut grid, COMPUTER, r#""Hello!""#));
    driver.tick(&mut grid, &mut events);
    assert_eq!(
        output_of(&grid).error_kind(),
        Some(ScriptErrorKind::InterpreterUnavailable),
        "an explicit edit retries and reports again"
    );
}

#[test]
fn configured_default_source_runs_without_an_edit() {
    let driver = &mut driver_with_script(ScriptConfig {
        run_default_source: true,
        ..ScriptConfig::default()
    });
    let mut grid = Grid::new();
    let mut events = EventBus::new();
    assert!(driver.create_cell(&mut grid, CellKind::Computer, COMPUTER));

    driver.tick(&mut grid, &mut events);

    assert_eq!(output_of(&grid), ScriptOutput::Text("Hello!".to_string()));
}

#[test]
fn script_failure_never_disturbs_other_cells() {
    let mut driver = TickDriver::default();
    let mut grid = Grid::new();
    let mut events = EventBus::new();
    assert!(driver.create_cell(&mut grid, CellKind::Computer, (0, 0)));
    assert!(driver.create_cell(&mut grid, CellKind::Computer, (5, 0)));
    assert!(driver.edit_source(&mut grid, (0, 0), "broken("));
    assert!(driver.edit_source(&mut grid, (5, 0), "10 * 10"));

    driver.tick(&mut grid, &mut events);

    assert_eq!(
        grid.cell((0, 0)).and_then(|c| c.output.clone()).and_then(|o| o.error_kind()),
        Some(ScriptErrorKind::Compile)
    );
    assert_eq!(
        grid.cell((5, 0)).and_then(|c| c.output.clone()),
        Some(ScriptOutput::Text("100".to_string()))
    );
}
