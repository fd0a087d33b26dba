//! Browser bindings for the javapad playground.
//!
//! The page script fetches the engine module and both class-library
//! archives over HTTP, records each response with [`WebPlayground::provide_resource`],
//! and then runs the real initialization sequencer via
//! [`WebPlayground::initialize`]; status codes and ordering semantics live
//! in `javapad-core`, not in JavaScript. The remaining methods map one to
//! one onto the UI surface: Compile, Run, Clear, the source editor, and the
//! status/output/console panes.

use javapad_core::{CompileOutcome, MemoryFetcher, PlaygroundSession};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebPlayground {
    session: PlaygroundSession,
    resources: MemoryFetcher,
}

#[wasm_bindgen]
impl WebPlayground {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebPlayground {
        WebPlayground {
            session: PlaygroundSession::new(),
            resources: MemoryFetcher::new(),
        }
    }

    /// Records one fetched resource. Non-2xx responses are stored as bare
    /// statuses so the sequencer can report them; a dead transport is
    /// status 0.
    pub fn provide_resource(&mut self, name: &str, status: u16, bytes: &[u8]) {
        if (200..300).contains(&status) {
            self.resources.insert(name, bytes.to_vec());
        } else {
            self.resources.insert_error(name, status);
        }
    }

    /// Runs the initialization sequence over the provided resources.
    /// Returns whether the session became ready; failure detail is in
    /// `status()` and `console_log()`.
    pub fn initialize(&mut self) -> bool {
        let _ = self.session.initialize(&self.resources);
        self.session.is_ready()
    }

    /// Compiles the current source buffer. Returns false when the engine is
    /// not ready yet, which the page turns into a blocking alert.
    pub fn compile(&mut self) -> bool {
        self.session.compile() != CompileOutcome::NotReady
    }

    /// Re-executes the retained program; output lands in the console log.
    pub fn run(&mut self) {
        self.session.run();
    }

    /// Resets source, output, console, and the runnable flag.
    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn set_source(&mut self, source: &str) {
        self.session.set_source(source);
    }

    pub fn source(&self) -> String {
        self.session.source().to_string()
    }

    pub fn output(&self) -> String {
        self.session.output().to_string()
    }

    pub fn status(&self) -> String {
        self.session.status().to_string()
    }

    pub fn console_log(&self) -> String {
        self.session.console_log()
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn is_runnable(&self) -> bool {
        self.session.is_runnable()
    }
}

impl Default for WebPlayground {
    fn default() -> Self {
        Self::new()
    }
}
