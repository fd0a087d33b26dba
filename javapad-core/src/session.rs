//! The playground session: initialization sequencing, compilation
//! orchestration, and the Run/Clear actions.
//!
//! All session state is owned by [`PlaygroundSession`] and passed into the
//! orchestration methods explicitly; there are no process-wide singletons.
//! Every action catches its own failures at the boundary, converts them to a
//! status string and console text, and leaves the session usable, except
//! that an initialization failure is terminal: the readiness flag stays
//! false and only a fresh session recovers.

use crate::console::ConsoleSink;
use crate::diagnostic::DiagnosticSink;
use crate::engine::CompilerHandle;
use crate::error::PlaygroundError;
use crate::fetch::{ENGINE_RESOURCE, RUNTIME_RESOURCE, ResourceFetcher, SDK_RESOURCE};
use crate::loader::{MainOutcome, ModuleLoader};

/// Virtual filename for the single source unit.
pub const SOURCE_FILE_NAME: &str = "Main.java";
/// Output name passed to `generateWebAssembly`; the artifact is fetched as
/// `<OUTPUT_NAME>.wasm`.
pub const OUTPUT_NAME: &str = "app";
/// Entry class passed to `generateWebAssembly`.
pub const MAIN_CLASS: &str = "Main";

/// The fixed default sample the source buffer starts with and Clear resets
/// to.
pub const DEFAULT_SOURCE: &str = r#"public class Main {
    public static void main(String[] args) {
        System.out.println("Hello from Java!");
        System.out.println("Java compiled to WebAssembly!");

        int result = fibonacci(10);
        System.out.println("Fibonacci(10) = " + result);
    }

    public static int fibonacci(int n) {
        if (n <= 1) return n;
        return fibonacci(n - 1) + fibonacci(n - 2);
    }
}
"#;

/// Output buffer placeholder when the compiler reports failure.
pub const COMPILE_FAILED_PLACEHOLDER: &str = "// Java compilation failed";
/// Output buffer placeholder when generation succeeds but no artifact
/// exists or it is empty.
pub const NO_OUTPUT_PLACEHOLDER: &str = "// No WebAssembly output found";
/// Output buffer placeholder when the program ran without printing
/// anything.
pub const SILENT_OUTPUT_PLACEHOLDER: &str = "// Compilation successful\n\
// WebAssembly module generated and executed\n\
// Check the console log for results";
/// Console message for a Run with nothing runnable.
pub const NOTHING_TO_RUN_MESSAGE: &str = "Nothing to run. Compile first.\n";

/// How a compile action ended. The session state (status, output buffer,
/// console log, runnable flag) carries the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Initialization has not completed; nothing was touched.
    NotReady,
    /// The compiler reported unsuccessful compilation.
    CompileFailed,
    /// Artifact generation trapped.
    GenerationFailed,
    /// Compilation succeeded but no (non-empty) artifact was produced.
    NoArtifact,
    /// The program ran and produced output; Run is now available.
    Executed,
    /// The program ran (or could not be executed) without producing output.
    ExecutedSilently,
    /// An uncaught error was converted at the action boundary.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToRun,
    Ran,
    Failed,
}

/// Owned session state for one playground UI.
pub struct PlaygroundSession {
    console: ConsoleSink,
    diagnostics: DiagnosticSink,
    loader: ModuleLoader,
    compiler: Option<CompilerHandle>,
    ready: bool,
    source: String,
    output: String,
    status: String,
    runnable: bool,
    program: Option<Vec<u8>>,
}

impl Default for PlaygroundSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaygroundSession {
    pub fn new() -> Self {
        let console = ConsoleSink::new();
        let diagnostics = DiagnosticSink::new();
        let loader = ModuleLoader::new(console.clone(), diagnostics.clone());
        Self {
            console,
            diagnostics,
            loader,
            compiler: None,
            ready: false,
            source: DEFAULT_SOURCE.to_string(),
            output: String::new(),
            status: "Loading...".to_string(),
            runnable: false,
            program: None,
        }
    }

    // ---------------------------------------------------------------
    // Initialization sequencer
    // ---------------------------------------------------------------

    /// Loads the compiler engine and registers both class-library archives,
    /// strictly in order. The readiness flag becomes true only after all
    /// three steps succeed; any failure leaves it false for good.
    pub fn initialize(&mut self, fetcher: &dyn ResourceFetcher) -> Result<(), PlaygroundError> {
        self.status = "Loading compiler...".to_string();
        self.console.write("Initializing compiler engine...\n");
        match self.try_initialize(fetcher) {
            Ok(()) => {
                self.ready = true;
                self.status = "Ready to compile!".to_string();
                self.console
                    .write("Initialization complete. Ready to compile Java code.\n");
                Ok(())
            }
            Err(err) => {
                self.status = format!("Error: {err}");
                self.console.write(&format!("Initialization error: {err}\n"));
                Err(err)
            }
        }
    }

    fn try_initialize(&mut self, fetcher: &dyn ResourceFetcher) -> Result<(), PlaygroundError> {
        let engine_bytes = fetcher.fetch(ENGINE_RESOURCE)?;
        let module = self.loader.load_bytes(&engine_bytes)?;
        self.console.write("Compiler engine loaded\n");
        let mut compiler = CompilerHandle::create(module)?;
        self.console.write("Compiler instance created\n");

        self.status = "Loading SDK...".to_string();
        let sdk = fetcher.fetch(SDK_RESOURCE)?;
        self.console
            .write(&format!("SDK loaded: {} bytes\n", sdk.len()));
        compiler.set_sdk(&sdk)?;

        self.status = "Loading runtime...".to_string();
        let runtime = fetcher.fetch(RUNTIME_RESOURCE)?;
        self.console
            .write(&format!("Runtime classlib loaded: {} bytes\n", runtime.len()));
        compiler.set_teavm_classlib(&runtime)?;

        self.compiler = Some(compiler);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Compilation orchestrator
    // ---------------------------------------------------------------

    /// Runs the full compile pipeline on the current source buffer.
    ///
    /// Aborts before any state mutation when the session is not ready; the
    /// front-end turns that into a blocking alert.
    pub fn compile(&mut self) -> CompileOutcome {
        if !self.ready {
            return CompileOutcome::NotReady;
        }

        self.status = "Compiling...".to_string();
        self.console.clear();
        self.console.write("Starting compilation...\n");
        self.runnable = false;
        self.program = None;

        let listener = match self.compiler.as_ref() {
            Some(compiler) => compiler.on_diagnostic(),
            None => return CompileOutcome::NotReady,
        };
        let result = self.compile_inner();
        // Detached regardless of outcome.
        listener.destroy();

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.output = format!("// Error: {err}");
                self.status = format!("Compilation error: {err}");
                self.console.write(&format!("Compilation error: {err}\n"));
                CompileOutcome::Failed
            }
        }
    }

    fn compile_inner(&mut self) -> Result<CompileOutcome, PlaygroundError> {
        let console = self.console.clone();
        let Some(compiler) = self.compiler.as_mut() else {
            return Err(PlaygroundError::NotReady);
        };

        compiler.clear_source_files()?;
        compiler.add_source_file(SOURCE_FILE_NAME, &self.source)?;
        console.write("Source file added, compiling Java...\n");

        let compiled = compiler.compile()?;
        console.write(&format!("Java compilation result: {compiled}\n"));
        if !compiled {
            console.write("Java compilation failed\n");
            self.output = COMPILE_FAILED_PLACEHOLDER.to_string();
            self.status = "Java compilation failed".to_string();
            return Ok(CompileOutcome::CompileFailed);
        }

        console.write("Generating WebAssembly...\n");
        if let Err(err) = compiler.generate_web_assembly(OUTPUT_NAME, MAIN_CLASS) {
            console.write(&format!("{err}\n"));
            self.output = format!("// {err}");
            self.status = "Code generation failed".to_string();
            return Ok(CompileOutcome::GenerationFailed);
        }
        console.write("WebAssembly generation completed\n");

        let artifact = compiler.get_web_assembly_output_file(&format!("{OUTPUT_NAME}.wasm"))?;
        let Some(bytes) = artifact.filter(|bytes| !bytes.is_empty()) else {
            console.write("No WebAssembly output found\n");
            self.output = NO_OUTPUT_PLACEHOLDER.to_string();
            self.status = "Compilation successful (no output file)".to_string();
            return Ok(CompileOutcome::NoArtifact);
        };
        console.write(&format!("WebAssembly module: {} bytes\n", bytes.len()));

        // Execution failure is non-fatal and degrades to a
        // success-without-execution outcome.
        let captured = self.execute_artifact(&bytes);
        if !captured.trim().is_empty() {
            self.output = captured;
            self.status = "Compilation and execution successful!".to_string();
            self.runnable = true;
            self.program = Some(bytes);
            Ok(CompileOutcome::Executed)
        } else {
            self.output = SILENT_OUTPUT_PLACEHOLDER.to_string();
            self.status = "Compilation successful (no program output)".to_string();
            self.program = Some(bytes);
            Ok(CompileOutcome::ExecutedSilently)
        }
    }

    fn execute_artifact(&mut self, bytes: &[u8]) -> String {
        match self.try_execute(bytes) {
            Ok(captured) => captured,
            Err(err) => {
                self.console
                    .write(&format!("WebAssembly execution failed: {err}\n"));
                String::new()
            }
        }
    }

    fn try_execute(&mut self, bytes: &[u8]) -> Result<String, PlaygroundError> {
        let mut module = self.loader.load_bytes(bytes)?;
        self.console.write("WebAssembly module loaded successfully\n");

        let guard = self.console.begin_capture()?;
        let outcome = module.invoke_main();
        let captured = guard.finish();

        match outcome {
            Ok(MainOutcome::Executed) => {
                self.console.write("Executed WebAssembly main method\n");
            }
            Ok(MainOutcome::MissingMain(exports)) => {
                self.console
                    .write("No main method found in WebAssembly exports\n");
                self.console
                    .write(&format!("Available exports: {}\n", exports.join(", ")));
            }
            Err(err) => {
                // Partial output from before the trap still belongs in the
                // console log.
                if !captured.is_empty() {
                    self.console.write(&captured);
                }
                return Err(err);
            }
        }
        Ok(captured)
    }

    // ---------------------------------------------------------------
    // Run and Clear actions
    // ---------------------------------------------------------------

    /// Re-executes the retained compiled module's entry point in a fresh
    /// instance, capturing its output into the console log. Does not touch
    /// the output buffer.
    pub fn run(&mut self) -> RunOutcome {
        if !self.runnable || is_error_placeholder(&self.output) || self.program.is_none() {
            self.console.clear();
            self.console.write(NOTHING_TO_RUN_MESSAGE);
            return RunOutcome::NothingToRun;
        }

        self.console.clear();
        let bytes = self.program.clone().unwrap_or_default();
        match self.run_program(&bytes) {
            Ok(captured) => {
                if captured.trim().is_empty() {
                    self.console
                        .write("Program executed successfully (no output)\n");
                } else {
                    self.console.write(&captured);
                }
                self.status = "Run complete".to_string();
                RunOutcome::Ran
            }
            Err(err) => {
                self.console.write(&format!("Runtime error: {err}\n"));
                self.status = format!("Runtime error: {err}");
                RunOutcome::Failed
            }
        }
    }

    fn run_program(&mut self, bytes: &[u8]) -> Result<String, PlaygroundError> {
        let mut module = self.loader.load_bytes(bytes)?;
        let guard = self.console.begin_capture()?;
        let outcome = module.invoke_main();
        let captured = guard.finish();
        match outcome? {
            MainOutcome::Executed => Ok(captured),
            MainOutcome::MissingMain(_) => Err(PlaygroundError::Runtime(
                "retained program has no main export".to_string(),
            )),
        }
    }

    /// Resets source, output, console, and the runnable flag regardless of
    /// prior state. Always permitted.
    pub fn clear(&mut self) {
        self.source = DEFAULT_SOURCE.to_string();
        self.output.clear();
        self.console.clear();
        self.runnable = false;
        self.program = None;
        self.status = if self.ready {
            "Ready to compile!".to_string()
        } else {
            "Loading...".to_string()
        };
    }

    // ---------------------------------------------------------------
    // State accessors
    // ---------------------------------------------------------------

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn console_log(&self) -> String {
        self.console.contents()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_runnable(&self) -> bool {
        self.runnable
    }

    /// The last generated artifact, retained for the Run action.
    pub fn artifact(&self) -> Option<&[u8]> {
        self.program.as_deref()
    }
}

fn is_error_placeholder(output: &str) -> bool {
    output.starts_with(COMPILE_FAILED_PLACEHOLDER)
        || output.starts_with("// Error:")
        || output.starts_with("// code generation failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_buffer_reflects_edits() {
        let mut session = PlaygroundSession::new();
        assert_eq!(session.source(), DEFAULT_SOURCE);
        session.set_source("class A {}");
        assert_eq!(session.source(), "class A {}");
    }

    #[test]
    fn compile_is_a_no_op_before_initialization() {
        let mut session = PlaygroundSession::new();
        session.set_source("class A {}");
        assert_eq!(session.compile(), CompileOutcome::NotReady);
        assert_eq!(session.output(), "");
        assert_eq!(session.console_log(), "");
        assert_eq!(session.status(), "Loading...");
        assert!(!session.is_runnable());
    }

    #[test]
    fn recognizes_failure_placeholders() {
        assert!(is_error_placeholder(COMPILE_FAILED_PLACEHOLDER));
        assert!(is_error_placeholder("// Error: something broke"));
        assert!(!is_error_placeholder("Hello from Java!\n"));
        assert!(!is_error_placeholder(SILENT_OUTPUT_PLACEHOLDER));
    }

    #[test]
    fn clear_resets_state_without_initialization() {
        let mut session = PlaygroundSession::new();
        session.set_source("garbage");
        session.clear();
        assert_eq!(session.source(), DEFAULT_SOURCE);
        assert_eq!(session.output(), "");
        assert_eq!(session.console_log(), "");
        assert!(!session.is_runnable());
        assert_eq!(session.status(), "Loading...");
    }
}
