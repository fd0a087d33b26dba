//! Dynamic loading of binary execution modules.
//!
//! Both the compiler engine and the programs it generates are plain wasm
//! modules hosted in `wasmi`. Every load gets a fresh store and instance;
//! the only shared state is the console and diagnostic sinks wired into the
//! `teavm.log` and `teavm.diagnostic` host imports.
//!
//! Host-to-guest buffers go through the module's exported bump allocator:
//! the host calls `alloc(len)`, writes into the exported `memory` at the
//! returned offset, and passes `(ptr, len)` pairs to the engine's exports.

use wasmi::{Caller, Engine, Extern, Linker, Memory, Module, Store};

use crate::console::ConsoleSink;
use crate::diagnostic::{Diagnostic, DiagnosticSink, Severity};
use crate::error::PlaygroundError;

/// Shared host state reachable from import closures.
#[derive(Debug)]
pub struct HostState {
    pub console: ConsoleSink,
    pub diagnostics: DiagnosticSink,
}

/// Result of invoking a generated program's entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainOutcome {
    Executed,
    /// No niladic `main` export; carries the export names that were found.
    MissingMain(Vec<String>),
}

/// Loads binary modules and wires them to the shared sinks.
pub struct ModuleLoader {
    engine: Engine,
    console: ConsoleSink,
    diagnostics: DiagnosticSink,
}

impl ModuleLoader {
    pub fn new(console: ConsoleSink, diagnostics: DiagnosticSink) -> Self {
        Self {
            engine: Engine::default(),
            console,
            diagnostics,
        }
    }

    /// Instantiates a module from raw bytes.
    ///
    /// Fails with [`PlaygroundError::ModuleLoad`] if the bytes are not a
    /// valid module or instantiation fails. Loading has no side effect
    /// beyond allocating the instance.
    pub fn load_bytes(&self, wasm: &[u8]) -> Result<LoadedModule, PlaygroundError> {
        let module = Module::new(&self.engine, wasm)
            .map_err(|err| PlaygroundError::ModuleLoad(err.to_string()))?;

        let mut linker = Linker::new(&self.engine);
        linker
            .func_wrap(
                "teavm",
                "log",
                |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                    if let Some(text) = read_guest_string(&mut caller, ptr, len) {
                        caller.data().console.write(&text);
                    }
                },
            )
            .map_err(|err| PlaygroundError::ModuleLoad(err.to_string()))?;
        linker
            .func_wrap(
                "teavm",
                "diagnostic",
                |mut caller: Caller<'_, HostState>,
                 severity: i32,
                 file_ptr: i32,
                 file_len: i32,
                 line: i32,
                 msg_ptr: i32,
                 msg_len: i32| {
                    if !caller.data().diagnostics.is_active() {
                        return;
                    }
                    let file_name = read_guest_string(&mut caller, file_ptr, file_len)
                        .unwrap_or_default();
                    let message =
                        read_guest_string(&mut caller, msg_ptr, msg_len).unwrap_or_default();
                    let diagnostic = Diagnostic {
                        severity: Severity::from_code(severity as u32),
                        file_name,
                        line_number: line as u32,
                        message,
                    };
                    // Streamed into the console log as it arrives.
                    caller.data().console.write(&format!("{diagnostic}\n"));
                    caller.data().diagnostics.record(diagnostic);
                },
            )
            .map_err(|err| PlaygroundError::ModuleLoad(err.to_string()))?;

        let mut store = Store::new(
            &self.engine,
            HostState {
                console: self.console.clone(),
                diagnostics: self.diagnostics.clone(),
            },
        );
        let instance = linker
            .instantiate_and_start(&mut store, &module)
            .map_err(|err| PlaygroundError::ModuleLoad(err.to_string()))?;

        Ok(LoadedModule { store, instance })
    }
}

fn read_guest_string(caller: &mut Caller<'_, HostState>, ptr: i32, len: i32) -> Option<String> {
    let memory = caller.get_export("memory").and_then(Extern::into_memory)?;
    let ptr = usize::try_from(ptr).ok()?;
    let len = usize::try_from(len).ok()?;
    let mut buffer = vec![0u8; len];
    memory.read(&*caller, ptr, &mut buffer).ok()?;
    Some(String::from_utf8_lossy(&buffer).into_owned())
}

/// An instantiated module and its private store.
#[derive(Debug)]
pub struct LoadedModule {
    pub(crate) store: Store<HostState>,
    pub(crate) instance: wasmi::Instance,
}

impl LoadedModule {
    pub fn export_names(&self) -> Vec<String> {
        self.instance
            .exports(&self.store)
            .map(|export| export.name().to_string())
            .collect()
    }

    /// Invokes the exported niladic `main`, if there is one.
    ///
    /// A trap during execution is an [`PlaygroundError::Execution`]; a
    /// missing or differently shaped `main` is not an error and reports the
    /// available exports instead.
    pub fn invoke_main(&mut self) -> Result<MainOutcome, PlaygroundError> {
        if let Ok(main) = self.instance.get_typed_func::<(), ()>(&self.store, "main") {
            main.call(&mut self.store, ())
                .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
            return Ok(MainOutcome::Executed);
        }
        if let Ok(main) = self.instance.get_typed_func::<(), i32>(&self.store, "main") {
            main.call(&mut self.store, ())
                .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
            return Ok(MainOutcome::Executed);
        }
        Ok(MainOutcome::MissingMain(self.export_names()))
    }

    pub(crate) fn memory(&self) -> Result<Memory, PlaygroundError> {
        self.instance
            .get_memory(&self.store, "memory")
            .ok_or_else(|| PlaygroundError::ModuleLoad("module does not export memory".to_string()))
    }

    /// Copies bytes into guest memory via the exported allocator and returns
    /// the `(ptr, len)` pair to pass along.
    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(i32, i32), PlaygroundError> {
        let alloc = self
            .instance
            .get_typed_func::<i32, i32>(&self.store, "alloc")
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("alloc export missing: {err}"))
            })?;
        let len = i32::try_from(bytes.len())
            .map_err(|_| PlaygroundError::Execution("buffer too large for guest".to_string()))?;
        let ptr = alloc
            .call(&mut self.store, len)
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        let memory = self.memory()?;
        memory
            .write(&mut self.store, ptr as u32 as usize, bytes)
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        Ok((ptr, len))
    }

    pub(crate) fn read_bytes(&self, ptr: u32, len: u32) -> Result<Vec<u8>, PlaygroundError> {
        let memory = self.memory()?;
        let mut buffer = vec![0u8; len as usize];
        memory
            .read(&self.store, ptr as usize, &mut buffer)
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        Ok(buffer)
    }
}
