//! Stub compiler engine and tiny program artifacts, emitted with
//! `wasm-encoder`.
//!
//! The real compiler engine is an externally supplied binary. The stub
//! implements the same export surface with canned behavior so the host, the
//! CLI, and the web bindings can be exercised end to end without the real
//! toolchain: `compile()` returns a configured result, canned diagnostics
//! are replayed through the `teavm.diagnostic` import, and
//! `getWebAssemblyOutputFile` hands back an embedded program artifact.
//!
//! This is test-and-demo tooling, not a compiler.

use wasm_encoder::{
    CodeSection, ConstExpr, DataSection, EntityType, ExportKind, ExportSection, Function,
    FunctionSection, GlobalSection, GlobalType, ImportSection, Instruction, MemorySection,
    MemoryType, Module, TypeSection, ValType,
};

use crate::diagnostic::{Diagnostic, Severity};

// Data segments live in the first page; the bump allocator starts at the
// second so host writes never clobber embedded data.
const DATA_BASE: u32 = 16;
const HEAP_BASE: i32 = 65536;
const ENGINE_PAGES: u64 = 32;

/// Configurable stub engine module.
pub struct StubEngine {
    compile_ok: bool,
    generation_trap: bool,
    diagnostics: Vec<Diagnostic>,
    artifact: Option<Vec<u8>>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEngine {
    /// A well-behaved engine: compilation succeeds and the artifact is a
    /// program printing a greeting.
    pub fn new() -> Self {
        Self {
            compile_ok: true,
            generation_trap: false,
            diagnostics: Vec::new(),
            artifact: Some(print_program("Hello from Java!\n")),
        }
    }

    /// `compile()` reports failure after replaying the given diagnostics.
    pub fn compile_failure(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.compile_ok = false;
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_artifact(mut self, bytes: Vec<u8>) -> Self {
        self.artifact = Some(bytes);
        self
    }

    /// `getWebAssemblyOutputFile` answers with zero-length bytes.
    pub fn with_empty_artifact(mut self) -> Self {
        self.artifact = Some(Vec::new());
        self
    }

    /// `getWebAssemblyOutputFile` answers "no such file".
    pub fn without_artifact(mut self) -> Self {
        self.artifact = None;
        self
    }

    /// `generateWebAssembly` traps.
    pub fn generation_trap(mut self) -> Self {
        self.generation_trap = true;
        self
    }

    /// Emits the engine module bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut blob: Vec<u8> = Vec::new();
        let mut place = |bytes: &[u8]| -> (i32, i32) {
            let offset = DATA_BASE + blob.len() as u32;
            blob.extend_from_slice(bytes);
            (offset as i32, bytes.len() as i32)
        };

        let diagnostics: Vec<(i32, (i32, i32), i32, (i32, i32))> = self
            .diagnostics
            .iter()
            .map(|diagnostic| {
                let file = place(diagnostic.file_name.as_bytes());
                let message = place(diagnostic.message.as_bytes());
                (
                    severity_code(diagnostic.severity),
                    file,
                    diagnostic.line_number as i32,
                    message,
                )
            })
            .collect();
        let artifact = self.artifact.as_ref().map(|bytes| place(bytes));
        assert!(
            DATA_BASE as usize + blob.len() <= HEAP_BASE as usize,
            "stub data must fit below the heap base"
        );

        let mut module = Module::new();

        let mut types = TypeSection::new();
        let t_log = types.len();
        types.ty().function([ValType::I32, ValType::I32], []);
        let t_diagnostic = types.len();
        types.ty().function([ValType::I32; 6], []);
        let t_alloc = types.len();
        types.ty().function([ValType::I32], [ValType::I32]);
        let t_create = types.len();
        types.ty().function([], [ValType::I32]);
        let t_set = types.len();
        types.ty().function([ValType::I32; 3], []);
        let t_unary = types.len();
        types.ty().function([ValType::I32], []);
        let t_five = types.len();
        types.ty().function([ValType::I32; 5], []);
        let t_get = types.len();
        types.ty().function([ValType::I32; 3], [ValType::I64]);
        module.section(&types);

        let mut imports = ImportSection::new();
        imports.import("teavm", "log", EntityType::Function(t_log));
        imports.import("teavm", "diagnostic", EntityType::Function(t_diagnostic));
        module.section(&imports);
        let diagnostic_func = 1u32;

        let mut functions = FunctionSection::new();
        for ty in [
            t_alloc, t_create, t_set, t_set, t_unary, t_five, t_alloc, t_five, t_get,
        ] {
            functions.function(ty);
        }
        module.section(&functions);

        let mut memories = MemorySection::new();
        memories.memory(MemoryType {
            minimum: ENGINE_PAGES,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        module.section(&memories);

        let mut globals = GlobalSection::new();
        globals.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: true,
                shared: false,
            },
            &ConstExpr::i32_const(HEAP_BASE),
        );
        module.section(&globals);

        let mut exports = ExportSection::new();
        exports.export("memory", ExportKind::Memory, 0);
        let names = [
            "alloc",
            "createCompiler",
            "setSdk",
            "setTeaVMClasslib",
            "clearSourceFiles",
            "addSourceFile",
            "compile",
            "generateWebAssembly",
            "getWebAssemblyOutputFile",
        ];
        for (index, name) in names.iter().enumerate() {
            exports.export(name, ExportKind::Func, 2 + index as u32);
        }
        module.section(&exports);

        let mut code = CodeSection::new();

        // alloc: bump pointer, returns the previous top.
        let mut alloc = Function::new(vec![(1, ValType::I32)]);
        alloc.instruction(&Instruction::GlobalGet(0));
        alloc.instruction(&Instruction::LocalSet(1));
        alloc.instruction(&Instruction::LocalGet(1));
        alloc.instruction(&Instruction::LocalGet(0));
        alloc.instruction(&Instruction::I32Add);
        alloc.instruction(&Instruction::GlobalSet(0));
        alloc.instruction(&Instruction::LocalGet(1));
        alloc.instruction(&Instruction::End);
        code.function(&alloc);

        // createCompiler: a single canned instance id.
        let mut create = Function::new(Vec::new());
        create.instruction(&Instruction::I32Const(1));
        create.instruction(&Instruction::End);
        code.function(&create);

        // setSdk / setTeaVMClasslib / clearSourceFiles / addSourceFile accept
        // and discard their arguments.
        for _ in 0..4 {
            let mut noop = Function::new(Vec::new());
            noop.instruction(&Instruction::End);
            code.function(&noop);
        }

        // compile: replay canned diagnostics, then report the canned result.
        let mut compile = Function::new(Vec::new());
        for (severity, file, line, message) in &diagnostics {
            compile.instruction(&Instruction::I32Const(*severity));
            compile.instruction(&Instruction::I32Const(file.0));
            compile.instruction(&Instruction::I32Const(file.1));
            compile.instruction(&Instruction::I32Const(*line));
            compile.instruction(&Instruction::I32Const(message.0));
            compile.instruction(&Instruction::I32Const(message.1));
            compile.instruction(&Instruction::Call(diagnostic_func));
        }
        compile.instruction(&Instruction::I32Const(i32::from(self.compile_ok)));
        compile.instruction(&Instruction::End);
        code.function(&compile);

        let mut generate = Function::new(Vec::new());
        if self.generation_trap {
            generate.instruction(&Instruction::Unreachable);
        }
        generate.instruction(&Instruction::End);
        code.function(&generate);

        // getWebAssemblyOutputFile: (ptr << 32) | len, 0 when absent.
        let mut get = Function::new(Vec::new());
        let packed = match artifact {
            Some((ptr, len)) => ((ptr as u64) << 32 | len as u64) as i64,
            None => 0,
        };
        get.instruction(&Instruction::I64Const(packed));
        get.instruction(&Instruction::End);
        code.function(&get);

        module.section(&code);

        if !blob.is_empty() {
            let mut data = DataSection::new();
            data.active(
                0,
                &ConstExpr::i32_const(DATA_BASE as i32),
                blob.iter().copied(),
            );
            module.section(&data);
        }

        module.finish()
    }
}

fn severity_code(severity: Severity) -> i32 {
    match severity {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    }
}

/// A program artifact whose `main` prints the given text through
/// `teavm.log`.
pub fn print_program(text: &str) -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    let t_log = types.len();
    types.ty().function([ValType::I32, ValType::I32], []);
    let t_main = types.len();
    types.ty().function([], []);
    module.section(&types);

    let mut imports = ImportSection::new();
    imports.import("teavm", "log", EntityType::Function(t_log));
    module.section(&imports);

    let mut functions = FunctionSection::new();
    functions.function(t_main);
    module.section(&functions);

    let mut memories = MemorySection::new();
    memories.memory(MemoryType {
        minimum: 1,
        maximum: None,
        memory64: false,
        shared: false,
        page_size_log2: None,
    });
    module.section(&memories);

    let mut exports = ExportSection::new();
    exports.export("memory", ExportKind::Memory, 0);
    exports.export("main", ExportKind::Func, 1);
    module.section(&exports);

    let mut code = CodeSection::new();
    let mut main = Function::new(Vec::new());
    main.instruction(&Instruction::I32Const(8));
    main.instruction(&Instruction::I32Const(text.len() as i32));
    main.instruction(&Instruction::Call(0));
    main.instruction(&Instruction::End);
    code.function(&main);
    module.section(&code);

    let mut data = DataSection::new();
    data.active(0, &ConstExpr::i32_const(8), text.bytes());
    module.section(&data);

    module.finish()
}

/// A program whose `main` runs without producing any output.
pub fn silent_program() -> Vec<u8> {
    plain_program("main", false)
}

/// A program exporting `start` (and memory) but no `main`.
pub fn entryless_program() -> Vec<u8> {
    plain_program("start", false)
}

/// A program whose `main` traps immediately.
pub fn trapping_program() -> Vec<u8> {
    plain_program("main", true)
}

fn plain_program(entry: &str, traps: bool) -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    types.ty().function([], []);
    module.section(&types);

    let mut functions = FunctionSection::new();
    functions.function(0);
    module.section(&functions);

    let mut memories = MemorySection::new();
    memories.memory(MemoryType {
        minimum: 1,
        maximum: None,
        memory64: false,
        shared: false,
        page_size_log2: None,
    });
    module.section(&memories);

    let mut exports = ExportSection::new();
    exports.export("memory", ExportKind::Memory, 0);
    exports.export(entry, ExportKind::Func, 0);
    module.section(&exports);

    let mut code = CodeSection::new();
    let mut body = Function::new(Vec::new());
    if traps {
        body.instruction(&Instruction::Unreachable);
    }
    body.instruction(&Instruction::End);
    code.function(&body);
    module.section(&code);

    module.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(bytes: &[u8]) {
        wasmparser::Validator::new()
            .validate_all(bytes)
            .expect("module should validate");
    }

    #[test]
    fn emitted_modules_validate() {
        validate(&StubEngine::new().build());
        validate(
            &StubEngine::new()
                .compile_failure(vec![Diagnostic {
                    severity: Severity::Error,
                    file_name: "Main.java".to_string(),
                    line_number: 1,
                    message: "boom".to_string(),
                }])
                .build(),
        );
        validate(&StubEngine::new().generation_trap().build());
        validate(&StubEngine::new().without_artifact().build());
        validate(&print_program("hi\n"));
        validate(&silent_program());
        validate(&entryless_program());
        validate(&trapping_program());
    }

    #[test]
    fn default_artifact_is_a_printing_program() {
        let engine = StubEngine::new();
        let bytes = engine.build();
        // The embedded artifact is itself a valid module.
        let artifact = print_program("Hello from Java!\n");
        assert!(
            bytes
                .windows(artifact.len())
                .any(|window| window == artifact.as_slice())
        );
    }
}
