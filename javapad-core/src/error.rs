use thiserror::Error;

/// Failure kinds for the playground host.
///
/// A compiler returning `false` from `compile()` is not an error here; it is
/// reported through [`CompileOutcome`](crate::session::CompileOutcome)
/// together with the collected diagnostics. These variants cover the paths
/// that throw.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("module load failed: {0}")]
    ModuleLoad(String),
    #[error("failed to fetch {resource}: HTTP {status}")]
    ResourceFetch { resource: String, status: u16 },
    #[error("code generation failed: {0}")]
    Generation(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("compiler engine is not ready")]
    NotReady,
    #[error("console capture already active")]
    CaptureBusy,
}
