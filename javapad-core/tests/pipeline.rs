//! End-to-end pipeline tests driving a full session against the stub
//! engine: initialization, the compile pipeline with its failure modes, and
//! the Run and Clear actions.

use javapad_core::session::{
    COMPILE_FAILED_PLACEHOLDER, DEFAULT_SOURCE, NO_OUTPUT_PLACEHOLDER, NOTHING_TO_RUN_MESSAGE,
    SILENT_OUTPUT_PLACEHOLDER,
};
use javapad_core::stub::{self, StubEngine};
use javapad_core::{
    CompileOutcome, Diagnostic, MemoryFetcher, PlaygroundSession, RunOutcome, Severity,
    ENGINE_RESOURCE, RUNTIME_RESOURCE, SDK_RESOURCE,
};

fn resources_for(engine: &StubEngine) -> MemoryFetcher {
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert(ENGINE_RESOURCE, engine.build());
    fetcher.insert(SDK_RESOURCE, vec![1; 64]);
    fetcher.insert(RUNTIME_RESOURCE, vec![2; 64]);
    fetcher
}

fn ready_session(engine: &StubEngine) -> PlaygroundSession {
    let mut session = PlaygroundSession::new();
    session
        .initialize(&resources_for(engine))
        .expect("initialization should succeed");
    session
}

#[test]
fn full_pipeline_puts_captured_output_in_the_output_buffer() {
    let mut session = ready_session(&StubEngine::new());
    assert!(session.is_ready());
    assert_eq!(session.status(), "Ready to compile!");

    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::Executed);
    assert_eq!(session.output(), "Hello from Java!\n");
    assert!(session.is_runnable());
    assert_eq!(session.status(), "Compilation and execution successful!");
    assert!(session.console_log().contains("Executed WebAssembly main method"));
}

#[test]
fn compile_failure_reports_one_console_line_per_diagnostic() {
    let engine = StubEngine::new().compile_failure(vec![
        Diagnostic {
            severity: Severity::Error,
            file_name: "Main.java".to_string(),
            line_number: 3,
            message: "';' expected".to_string(),
        },
        Diagnostic {
            severity: Severity::Warning,
            file_name: "Main.java".to_string(),
            line_number: 7,
            message: "unused variable x".to_string(),
        },
    ]);
    let mut session = ready_session(&engine);

    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::CompileFailed);
    assert_eq!(session.output(), COMPILE_FAILED_PLACEHOLDER);
    assert!(!session.is_runnable());

    let console = session.console_log();
    assert!(console.contains("[error] Main.java:3 - ';' expected"));
    assert!(console.contains("[warning] Main.java:7 - unused variable x"));
    assert_eq!(
        console
            .lines()
            .filter(|line| line.starts_with('['))
            .count(),
        2
    );
}

#[test]
fn runtime_classlib_404_is_terminal_for_the_session() {
    let engine = StubEngine::new();
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert(ENGINE_RESOURCE, engine.build());
    fetcher.insert(SDK_RESOURCE, vec![1; 64]);
    fetcher.insert_error(RUNTIME_RESOURCE, 404);

    let mut session = PlaygroundSession::new();
    let err = session.initialize(&fetcher).unwrap_err();
    assert!(err.to_string().contains("404"));
    assert!(session.status().contains("404"));
    assert!(!session.is_ready());

    // Compile stays disabled indefinitely and mutates nothing.
    let console_before = session.console_log();
    assert_eq!(session.compile(), CompileOutcome::NotReady);
    assert_eq!(session.console_log(), console_before);
    assert_eq!(session.output(), "");
}

#[test]
fn invalid_engine_module_fails_initialization() {
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert(ENGINE_RESOURCE, b"not wasm".to_vec());
    fetcher.insert(SDK_RESOURCE, vec![0; 4]);
    fetcher.insert(RUNTIME_RESOURCE, vec![0; 4]);

    let mut session = PlaygroundSession::new();
    assert!(session.initialize(&fetcher).is_err());
    assert!(!session.is_ready());
    assert!(session.status().starts_with("Error:"));
}

#[test]
fn empty_artifact_yields_the_no_output_placeholder() {
    let mut session = ready_session(&StubEngine::new().with_empty_artifact());
    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::NoArtifact);
    assert_eq!(session.output(), NO_OUTPUT_PLACEHOLDER);
    assert!(!session.is_runnable());
    assert!(session.console_log().contains("No WebAssembly output found"));
}

#[test]
fn missing_artifact_yields_the_no_output_placeholder() {
    let mut session = ready_session(&StubEngine::new().without_artifact());
    assert_eq!(session.compile(), CompileOutcome::NoArtifact);
    assert_eq!(session.output(), NO_OUTPUT_PLACEHOLDER);
}

#[test]
fn generation_trap_is_a_distinct_failure() {
    let mut session = ready_session(&StubEngine::new().generation_trap());
    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::GenerationFailed);
    assert!(session.output().starts_with("// code generation failed"));
    assert_eq!(session.status(), "Code generation failed");
    assert!(!session.is_runnable());
}

#[test]
fn silent_program_leaves_run_disabled() {
    let engine = StubEngine::new().with_artifact(stub::silent_program());
    let mut session = ready_session(&engine);
    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::ExecutedSilently);
    assert_eq!(session.output(), SILENT_OUTPUT_PLACEHOLDER);
    assert!(!session.is_runnable());

    assert_eq!(session.run(), RunOutcome::NothingToRun);
    assert_eq!(session.console_log(), NOTHING_TO_RUN_MESSAGE);
}

#[test]
fn program_without_main_lists_exports_instead_of_failing() {
    let engine = StubEngine::new().with_artifact(stub::entryless_program());
    let mut session = ready_session(&engine);
    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::ExecutedSilently);
    let console = session.console_log();
    assert!(console.contains("No main method found in WebAssembly exports"));
    assert!(console.contains("Available exports:"));
    assert!(console.contains("start"));
}

#[test]
fn trapping_program_degrades_to_success_without_execution() {
    let engine = StubEngine::new().with_artifact(stub::trapping_program());
    let mut session = ready_session(&engine);
    let outcome = session.compile();
    assert_eq!(outcome, CompileOutcome::ExecutedSilently);
    assert_eq!(session.output(), SILENT_OUTPUT_PLACEHOLDER);
    assert!(
        session
            .console_log()
            .contains("WebAssembly execution failed")
    );
}

#[test]
fn run_re_executes_the_retained_program() {
    let mut session = ready_session(&StubEngine::new());
    assert_eq!(session.compile(), CompileOutcome::Executed);

    let outcome = session.run();
    assert_eq!(outcome, RunOutcome::Ran);
    assert_eq!(session.console_log(), "Hello from Java!\n");
    // The output buffer is untouched by Run.
    assert_eq!(session.output(), "Hello from Java!\n");
    assert!(session.is_runnable());
}

#[test]
fn run_with_failure_placeholder_reports_nothing_to_run() {
    let engine = StubEngine::new().compile_failure(vec![Diagnostic {
        severity: Severity::Error,
        file_name: "Main.java".to_string(),
        line_number: 1,
        message: "broken".to_string(),
    }]);
    let mut session = ready_session(&engine);
    assert_eq!(session.compile(), CompileOutcome::CompileFailed);

    let outcome = session.run();
    assert_eq!(outcome, RunOutcome::NothingToRun);
    assert_eq!(session.output(), COMPILE_FAILED_PLACEHOLDER);
    assert_eq!(session.console_log(), NOTHING_TO_RUN_MESSAGE);
    assert!(!session.is_runnable());
}

#[test]
fn clear_resets_everything_regardless_of_prior_state() {
    let mut session = ready_session(&StubEngine::new());
    session.set_source("class Other {}");
    assert_eq!(session.compile(), CompileOutcome::Executed);

    session.clear();
    assert_eq!(session.source(), DEFAULT_SOURCE);
    assert_eq!(session.output(), "");
    assert_eq!(session.console_log(), "");
    assert!(!session.is_runnable());
    assert_eq!(session.status(), "Ready to compile!");

    // The session stays usable after a clear.
    assert_eq!(session.compile(), CompileOutcome::Executed);
}

#[test]
fn compile_resets_the_console_on_every_invocation() {
    let mut session = ready_session(&StubEngine::new());
    assert_eq!(session.compile(), CompileOutcome::Executed);
    let first = session.console_log();
    assert_eq!(session.compile(), CompileOutcome::Executed);
    assert_eq!(session.console_log(), first);
}
