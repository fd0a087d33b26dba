//! Core glue for the javapad Java-to-WebAssembly playground.
//!
//! The playground hosts an externally supplied compiler engine (a wasm
//! module with the TeaVM-style `createCompiler` export surface) and wires it
//! to a thin UI. The flow is:
//!
//!   initialize   (load engine, register both class-library archives)
//!     -> compile (reset sources, submit buffer, compile, generate artifact)
//!     -> execute (fresh instance, invoke main under console capture)
//!     -> run     (re-invoke the retained artifact on demand)
//!
//! Front-ends (CLI, web bindings) should depend on this crate rather than
//! talking to the engine module directly.

// ---------------------------------------------------------------------
// Errors, diagnostics, console capture
// ---------------------------------------------------------------------

pub mod console;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Resource access and module hosting
// ---------------------------------------------------------------------

pub mod fetch;
pub mod loader;

// ---------------------------------------------------------------------
// Engine surface and session orchestration
// ---------------------------------------------------------------------

pub mod engine;
pub mod session;

// ---------------------------------------------------------------------
// Stub engine for tests and demos
// ---------------------------------------------------------------------

pub mod stub;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use console::{CaptureGuard, ConsoleSink};
pub use diagnostic::{Diagnostic, DiagnosticListener, DiagnosticSink, Severity};
pub use engine::CompilerHandle;
pub use error::PlaygroundError;
pub use fetch::{
    DirFetcher, ENGINE_RESOURCE, MemoryFetcher, ResourceFetcher, RUNTIME_RESOURCE, SDK_RESOURCE,
};
pub use loader::{LoadedModule, MainOutcome, ModuleLoader};
pub use session::{
    CompileOutcome, DEFAULT_SOURCE, PlaygroundSession, RunOutcome, SOURCE_FILE_NAME,
};
