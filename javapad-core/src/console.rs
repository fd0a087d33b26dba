//! The process-wide console sink and scoped output capture.
//!
//! Loaded modules print through the `teavm.log` host import, which forwards
//! to a [`ConsoleSink`] shared between the session and every module instance.
//! [`ConsoleSink::begin_capture`] redirects writes into a capture buffer for
//! the lifetime of the returned guard; the guard restores the sink on every
//! exit path. Capture regions must not overlap: the UI serializes user
//! actions, and a nested `begin_capture` fails with
//! [`PlaygroundError::CaptureBusy`] rather than corrupting output.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::PlaygroundError;

#[derive(Debug, Default)]
struct SinkState {
    log: String,
    capture: Option<String>,
}

/// Append-only text accumulator acting as the logging sink.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    inner: Rc<RefCell<SinkState>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text to the console log, or to the capture buffer while a
    /// capture is active.
    pub fn write(&self, text: &str) {
        let mut state = self.inner.borrow_mut();
        match state.capture.as_mut() {
            Some(capture) => capture.push_str(text),
            None => state.log.push_str(text),
        }
    }

    pub fn contents(&self) -> String {
        self.inner.borrow().log.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().log.is_empty()
    }

    /// Clears the console log. An active capture buffer is left alone.
    pub fn clear(&self) {
        self.inner.borrow_mut().log.clear();
    }

    /// Starts a capture region. Until the returned guard is finished or
    /// dropped, all writes accumulate in the capture buffer instead of the
    /// log.
    pub fn begin_capture(&self) -> Result<CaptureGuard, PlaygroundError> {
        let mut state = self.inner.borrow_mut();
        if state.capture.is_some() {
            return Err(PlaygroundError::CaptureBusy);
        }
        state.capture = Some(String::new());
        drop(state);
        Ok(CaptureGuard {
            sink: self.clone(),
            finished: false,
        })
    }

    fn end_capture(&self) -> String {
        self.inner.borrow_mut().capture.take().unwrap_or_default()
    }
}

/// Scoped handle for an active capture region.
///
/// [`finish`](Self::finish) returns the captured text. If the guard is
/// dropped without finishing (an error exit), the captured text is flushed
/// back into the console log so it is not lost.
pub struct CaptureGuard {
    sink: ConsoleSink,
    finished: bool,
}

impl CaptureGuard {
    pub fn finish(mut self) -> String {
        self.finished = true;
        self.sink.end_capture()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.finished {
            let text = self.sink.end_capture();
            if !text.is_empty() {
                self.sink.write(&text);
            }
        }
    }
}
