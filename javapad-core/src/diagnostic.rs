//! Compiler diagnostics and the sink that collects them.
//!
//! Diagnostics arrive through the `teavm.diagnostic` host import while a
//! [`DiagnosticListener`] is attached. Each record is pushed into the shared
//! [`DiagnosticSink`] and, formatted, into the console log as it arrives.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Severity of a compiler-emitted message.
///
/// The wire encoding is a plain integer: 0 = error, 1 = warning, anything
/// else is treated as informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Severity::Error,
            1 => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured compiler-emitted message describing a compile-time issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file_name: String,
    pub line_number: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}:{} - {}",
            self.severity, self.file_name, self.line_number, self.message
        )
    }
}

#[derive(Debug, Default)]
struct DiagnosticState {
    active: bool,
    records: Vec<Diagnostic>,
}

/// Shared accumulator for diagnostics emitted by the compiler engine.
///
/// Records are only kept while a listener is attached; anything the engine
/// emits outside a compile call is dropped.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    inner: Rc<RefCell<DiagnosticState>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener. Records collected by a previous listener are
    /// discarded so every compile call starts from an empty set.
    pub fn listen(&self) -> DiagnosticListener {
        let mut state = self.inner.borrow_mut();
        state.active = true;
        state.records.clear();
        drop(state);
        DiagnosticListener { sink: self.clone() }
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    /// Stores a record if a listener is attached. Returns whether the record
    /// was accepted.
    pub(crate) fn record(&self, diagnostic: Diagnostic) -> bool {
        let mut state = self.inner.borrow_mut();
        if !state.active {
            return false;
        }
        state.records.push(diagnostic);
        true
    }

    /// Drains the collected records.
    pub fn take_records(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.inner.borrow_mut().records)
    }

    fn deactivate(&self) {
        self.inner.borrow_mut().active = false;
    }
}

/// Attachment handle returned by [`CompilerHandle::on_diagnostic`].
///
/// Dropping it (or calling [`destroy`](Self::destroy)) detaches the listener;
/// already collected records stay available in the sink.
///
/// [`CompilerHandle::on_diagnostic`]: crate::engine::CompilerHandle::on_diagnostic
pub struct DiagnosticListener {
    sink: DiagnosticSink,
}

impl DiagnosticListener {
    pub fn destroy(self) {}
}

impl Drop for DiagnosticListener {
    fn drop(&mut self) {
        self.sink.deactivate();
    }
}
