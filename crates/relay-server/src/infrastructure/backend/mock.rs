//! Recording fakes for the backend collaborators.
//!
//! # Why recording fakes?
//!
//! The real collaborators need a kmbox device on the network or a Windows
//! desktop with the target window open.  These fakes record every call in a
//! `Mutex<Vec<...>>` so tests, including the gRPC integration tests in
//! `tests/`, can assert exactly what reached the "backend" and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let endpoint = Arc::new(RecordingHardwareEndpoint::new());
//! let adapter = RawInjectionAdapter::new(Arc::clone(&endpoint) as _);
//!
//! adapter.hold_down(&BackendToken::Keycode(82)).unwrap();
//!
//! assert_eq!(endpoint.calls(), vec![HardwareCall::Down(82)]);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail` to make every call return
//! `BackendError::Unavailable`, for exercising error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use relay_core::KeyAction;

use crate::application::adapters::{
    HardwareEndpoint, InputSynthesizer, KeyStroke, TargetWindow, WindowFinder, WindowQuery,
};
use crate::application::relay_keys::BackendError;

/// One call made to a [`RecordingHardwareEndpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareCall {
    Press { code: u8, modifier: u8 },
    Down(u8),
    Up(u8),
}

/// A hardware endpoint that records calls instead of sending reports.
#[derive(Debug, Default)]
pub struct RecordingHardwareEndpoint {
    pub calls: Mutex<Vec<HardwareCall>>,
    pub should_fail: AtomicBool,
}

impl RecordingHardwareEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<HardwareCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: HardwareCall) -> Result<(), BackendError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("mock device failure".to_string()));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(())
    }
}

impl HardwareEndpoint for RecordingHardwareEndpoint {
    fn key_press(&self, code: u8, modifier: u8) -> Result<(), BackendError> {
        self.record(HardwareCall::Press { code, modifier })
    }

    fn key_down(&self, code: u8) -> Result<(), BackendError> {
        self.record(HardwareCall::Down(code))
    }

    fn key_up(&self, code: u8) -> Result<(), BackendError> {
        self.record(HardwareCall::Up(code))
    }
}

/// A target window whose focus and liveness are set by the test.
#[derive(Debug)]
pub struct ScriptedWindow {
    pub focused: AtomicBool,
    pub closed: AtomicBool,
}

impl ScriptedWindow {
    pub fn new(focused: bool) -> Self {
        Self {
            focused: AtomicBool::new(focused),
            closed: AtomicBool::new(false),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl TargetWindow for ScriptedWindow {
    fn has_keyboard_focus(&self) -> Result<bool, BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::WindowClosed);
        }
        Ok(self.focused.load(Ordering::SeqCst))
    }
}

/// Returns a fixed window (or none) for any query.
pub struct ScriptedWindowFinder {
    pub window: Option<Arc<ScriptedWindow>>,
}

impl WindowFinder for ScriptedWindowFinder {
    fn find_window(
        &self,
        _query: &WindowQuery,
    ) -> Result<Option<Arc<dyn TargetWindow>>, BackendError> {
        Ok(self
            .window
            .as_ref()
            .map(|w| Arc::clone(w) as Arc<dyn TargetWindow>))
    }
}

/// A synthesizer that records strokes instead of injecting them.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    pub strokes: Mutex<Vec<(KeyStroke, KeyAction)>>,
    pub should_fail: AtomicBool,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> Vec<(KeyStroke, KeyAction)> {
        self.strokes.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl InputSynthesizer for RecordingSynthesizer {
    fn synthesize(&self, stroke: &KeyStroke, action: KeyAction) -> Result<(), BackendError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("mock synthesis failure".to_string()));
        }
        if let Ok(mut strokes) = self.strokes.lock() {
            strokes.push((stroke.clone(), action));
        }
        Ok(())
    }
}
