//! Typed wrapper over the compiler engine module's exported surface.
//!
//! The engine is an externally supplied wasm module. Its callable surface is
//! the camelCase exports listed below; string and byte arguments travel as
//! `(ptr, len)` pairs written through the engine's exported allocator, and
//! `getWebAssemblyOutputFile` answers with `(ptr << 32) | len` packed in an
//! `i64` (0 meaning no such file).

use crate::diagnostic::DiagnosticListener;
use crate::error::PlaygroundError;
use crate::loader::LoadedModule;

/// Opaque reference to a loaded compiler instance.
///
/// Created once after the engine module is loaded; owned by the session and
/// never shared. All calls are synchronous and non-preemptible.
pub struct CompilerHandle {
    module: LoadedModule,
    compiler: i32,
}

impl CompilerHandle {
    /// Calls the engine's `createCompiler` export and wraps the returned
    /// instance id.
    pub fn create(mut module: LoadedModule) -> Result<Self, PlaygroundError> {
        let create = module
            .instance
            .get_typed_func::<(), i32>(&module.store, "createCompiler")
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("createCompiler export missing: {err}"))
            })?;
        let compiler = create
            .call(&mut module.store, ())
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        Ok(Self { module, compiler })
    }

    /// Registers the standard-library class archive.
    pub fn set_sdk(&mut self, bytes: &[u8]) -> Result<(), PlaygroundError> {
        self.call_with_bytes("setSdk", bytes)
    }

    /// Registers the runtime-support class archive.
    pub fn set_teavm_classlib(&mut self, bytes: &[u8]) -> Result<(), PlaygroundError> {
        self.call_with_bytes("setTeaVMClasslib", bytes)
    }

    pub fn clear_source_files(&mut self) -> Result<(), PlaygroundError> {
        let clear = self
            .module
            .instance
            .get_typed_func::<i32, ()>(&self.module.store, "clearSourceFiles")
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("clearSourceFiles export missing: {err}"))
            })?;
        clear
            .call(&mut self.module.store, self.compiler)
            .map_err(|err| PlaygroundError::Execution(err.to_string()))
    }

    pub fn add_source_file(&mut self, name: &str, text: &str) -> Result<(), PlaygroundError> {
        let (name_ptr, name_len) = self.module.write_bytes(name.as_bytes())?;
        let (text_ptr, text_len) = self.module.write_bytes(text.as_bytes())?;
        let add = self
            .module
            .instance
            .get_typed_func::<(i32, i32, i32, i32, i32), ()>(&self.module.store, "addSourceFile")
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("addSourceFile export missing: {err}"))
            })?;
        add.call(
            &mut self.module.store,
            (self.compiler, name_ptr, name_len, text_ptr, text_len),
        )
        .map_err(|err| PlaygroundError::Execution(err.to_string()))
    }

    /// Runs the compile operation. `false` means the compiler reported
    /// unsuccessful compilation; diagnostics arrive through the attached
    /// listener while this call is in flight.
    pub fn compile(&mut self) -> Result<bool, PlaygroundError> {
        let compile = self
            .module
            .instance
            .get_typed_func::<i32, i32>(&self.module.store, "compile")
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("compile export missing: {err}"))
            })?;
        let result = compile
            .call(&mut self.module.store, self.compiler)
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        Ok(result != 0)
    }

    /// Attaches a diagnostic listener; detaches on drop or `destroy()`.
    pub fn on_diagnostic(&self) -> DiagnosticListener {
        self.module.store.data().diagnostics.listen()
    }

    /// Triggers artifact generation for the given output name and entry
    /// class. A trap inside the engine is a [`PlaygroundError::Generation`],
    /// a different error kind from an unsuccessful compile.
    pub fn generate_web_assembly(
        &mut self,
        output_name: &str,
        main_class: &str,
    ) -> Result<(), PlaygroundError> {
        let (out_ptr, out_len) = self.module.write_bytes(output_name.as_bytes())?;
        let (main_ptr, main_len) = self.module.write_bytes(main_class.as_bytes())?;
        let generate = self
            .module
            .instance
            .get_typed_func::<(i32, i32, i32, i32, i32), ()>(
                &self.module.store,
                "generateWebAssembly",
            )
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("generateWebAssembly export missing: {err}"))
            })?;
        generate
            .call(
                &mut self.module.store,
                (self.compiler, out_ptr, out_len, main_ptr, main_len),
            )
            .map_err(|err| PlaygroundError::Generation(err.to_string()))
    }

    /// Fetches a generated output file. `None` when the engine has no file
    /// of that name; the returned bytes may be empty.
    pub fn get_web_assembly_output_file(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<u8>>, PlaygroundError> {
        let (name_ptr, name_len) = self.module.write_bytes(name.as_bytes())?;
        let get = self
            .module
            .instance
            .get_typed_func::<(i32, i32, i32), i64>(
                &self.module.store,
                "getWebAssemblyOutputFile",
            )
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!(
                    "getWebAssemblyOutputFile export missing: {err}"
                ))
            })?;
        let packed = get
            .call(&mut self.module.store, (self.compiler, name_ptr, name_len))
            .map_err(|err| PlaygroundError::Execution(err.to_string()))?;
        if packed == 0 {
            return Ok(None);
        }
        let ptr = (packed as u64 >> 32) as u32;
        let len = (packed as u64 & 0xffff_ffff) as u32;
        self.module.read_bytes(ptr, len).map(Some)
    }

    fn call_with_bytes(&mut self, export: &str, bytes: &[u8]) -> Result<(), PlaygroundError> {
        let (ptr, len) = self.module.write_bytes(bytes)?;
        let func = self
            .module
            .instance
            .get_typed_func::<(i32, i32, i32), ()>(&self.module.store, export)
            .map_err(|err| {
                PlaygroundError::ModuleLoad(format!("{export} export missing: {err}"))
            })?;
        func.call(&mut self.module.store, (self.compiler, ptr, len))
            .map_err(|err| PlaygroundError::Execution(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleSink;
    use crate::diagnostic::{Diagnostic, DiagnosticSink, Severity};
    use crate::loader::ModuleLoader;
    use crate::stub::StubEngine;

    fn handle(engine: &StubEngine) -> (CompilerHandle, ConsoleSink, DiagnosticSink) {
        let console = ConsoleSink::new();
        let diagnostics = DiagnosticSink::new();
        let loader = ModuleLoader::new(console.clone(), diagnostics.clone());
        let module = loader.load_bytes(&engine.build()).expect("load engine");
        let handle = CompilerHandle::create(module).expect("create compiler");
        (handle, console, diagnostics)
    }

    #[test]
    fn drives_the_full_export_surface() {
        let engine = StubEngine::new();
        let (mut compiler, _, _) = handle(&engine);

        compiler.set_sdk(b"sdk bytes").expect("setSdk");
        compiler.set_teavm_classlib(b"runtime bytes").expect("setTeaVMClasslib");
        compiler.clear_source_files().expect("clearSourceFiles");
        compiler
            .add_source_file("Main.java", "public class Main {}")
            .expect("addSourceFile");
        assert!(compiler.compile().expect("compile"));
        compiler
            .generate_web_assembly("app", "Main")
            .expect("generateWebAssembly");

        let artifact = compiler
            .get_web_assembly_output_file("app.wasm")
            .expect("getWebAssemblyOutputFile")
            .expect("artifact present");
        assert!(!artifact.is_empty());
        assert!(compiler.get_web_assembly_output_file("other.wasm").is_ok());
    }

    #[test]
    fn streams_diagnostics_while_listening() {
        let engine = StubEngine::new().compile_failure(vec![Diagnostic {
            severity: Severity::Error,
            file_name: "Main.java".to_string(),
            line_number: 3,
            message: "';' expected".to_string(),
        }]);
        let (mut compiler, console, diagnostics) = handle(&engine);

        let listener = compiler.on_diagnostic();
        assert!(!compiler.compile().expect("compile"));
        listener.destroy();

        let records = diagnostics.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "';' expected");
        assert!(
            console
                .contents()
                .contains("[error] Main.java:3 - ';' expected")
        );
    }

    #[test]
    fn generation_trap_is_a_generation_error() {
        let engine = StubEngine::new().generation_trap();
        let (mut compiler, _, _) = handle(&engine);
        let err = compiler.generate_web_assembly("app", "Main").unwrap_err();
        assert!(matches!(err, PlaygroundError::Generation(_)));
    }

    #[test]
    fn missing_artifact_is_none() {
        let engine = StubEngine::new().without_artifact();
        let (mut compiler, _, _) = handle(&engine);
        assert!(
            compiler
                .get_web_assembly_output_file("app.wasm")
                .expect("call")
                .is_none()
        );
    }
}
