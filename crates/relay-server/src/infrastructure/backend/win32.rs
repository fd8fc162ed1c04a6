//! Win32 collaborators for the focus-gated backend.
//!
//! - [`Win32WindowFinder`] locates the target window with `FindWindowW`.
//! - [`Win32Window`] compares the handle with `GetForegroundWindow` and
//!   detects a closed window with `IsWindow`.
//! - [`SendInputSynthesizer`] injects keyboard events with `SendInput`:
//!   literal characters as `KEYEVENTF_UNICODE` events, named keys as
//!   virtual-key events.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::sync::Arc;

use relay_core::keymap::windows_vk::{is_extended_vk, named_key_vk};
use relay_core::KeyAction;
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MAPVK_VK_TO_VSC, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetForegroundWindow, IsWindow};

use crate::application::adapters::{
    InputSynthesizer, KeyStroke, TargetWindow, WindowFinder, WindowQuery,
};
use crate::application::relay_keys::BackendError;

// ── Window lookup ─────────────────────────────────────────────────────────────

/// Finds top-level windows by class name and/or title.
#[derive(Debug, Default)]
pub struct Win32WindowFinder;

impl WindowFinder for Win32WindowFinder {
    fn find_window(
        &self,
        query: &WindowQuery,
    ) -> Result<Option<Arc<dyn TargetWindow>>, BackendError> {
        let class = query.class_name.as_deref().map(wide);
        let title = query.title.as_deref().map(wide);

        // SAFETY: both pointers are either null or point at null-terminated
        // UTF-16 buffers that outlive the call.
        let found = unsafe { FindWindowW(pcwstr(class.as_deref()), pcwstr(title.as_deref())) };

        match found {
            Ok(hwnd) if !hwnd.0.is_null() => {
                debug!(%query, handle = hwnd.0 as isize, "found target window");
                Ok(Some(Arc::new(Win32Window {
                    handle: hwnd.0 as isize,
                })))
            }
            // FindWindowW reports "no match" as an error with a null handle.
            _ => Ok(None),
        }
    }
}

/// A top-level window captured at startup.
///
/// The handle is stored as an integer so the type is `Send + Sync`; it is only
/// ever compared and passed back to Win32.
#[derive(Debug, Clone, Copy)]
pub struct Win32Window {
    handle: isize,
}

impl Win32Window {
    fn hwnd(self) -> HWND {
        HWND(self.handle as *mut c_void)
    }
}

impl TargetWindow for Win32Window {
    fn has_keyboard_focus(&self) -> Result<bool, BackendError> {
        // SAFETY: IsWindow and GetForegroundWindow accept any handle value.
        unsafe {
            if !IsWindow(self.hwnd()).as_bool() {
                return Err(BackendError::WindowClosed);
            }
            Ok(GetForegroundWindow().0 as isize == self.handle)
        }
    }
}

// ── Synthesis ─────────────────────────────────────────────────────────────────

/// Injects keyboard events into the system input stream.
#[derive(Debug, Default)]
pub struct SendInputSynthesizer;

impl InputSynthesizer for SendInputSynthesizer {
    fn synthesize(&self, stroke: &KeyStroke, action: KeyAction) -> Result<(), BackendError> {
        let (down, up) = match stroke {
            KeyStroke::Char(c) => unicode_events(*c),
            KeyStroke::Named(name) => {
                let vk = named_key_vk(name)
                    .ok_or_else(|| BackendError::InvalidKeyName(name.clone()))?;
                vk_events(vk)
            }
        };
        let inputs: Vec<INPUT> = match action {
            KeyAction::Press => down.into_iter().chain(up).collect(),
            KeyAction::HoldDown => down,
            KeyAction::Release => up,
        };
        send(&inputs)
    }
}

/// Down and up events for a literal character, one per UTF-16 unit.
fn unicode_events(c: char) -> (Vec<INPUT>, Vec<INPUT>) {
    let mut units = [0u16; 2];
    let units = c.encode_utf16(&mut units);
    let down = units
        .iter()
        .map(|&u| keyboard_input(VIRTUAL_KEY(0), u, KEYEVENTF_UNICODE))
        .collect();
    let up = units
        .iter()
        .map(|&u| keyboard_input(VIRTUAL_KEY(0), u, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP))
        .collect();
    (down, up)
}

fn vk_events(vk: u8) -> (Vec<INPUT>, Vec<INPUT>) {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if is_extended_vk(vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    // SAFETY: MapVirtualKeyW has no preconditions.
    let scan = unsafe { MapVirtualKeyW(u32::from(vk), MAPVK_VK_TO_VSC) } as u16;
    let key = VIRTUAL_KEY(u16::from(vk));
    (
        vec![keyboard_input(key, scan, flags)],
        vec![keyboard_input(key, scan, flags | KEYEVENTF_KEYUP)],
    )
}

fn keyboard_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), BackendError> {
    // SAFETY: `inputs` is a valid slice of initialised INPUT structures.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(BackendError::Unavailable(format!(
            "SendInput injected {sent} of {} events: {}",
            inputs.len(),
            windows::core::Error::from_win32()
        )));
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Null-terminated UTF-16 copy of `s`.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn pcwstr(buf: Option<&[u16]>) -> PCWSTR {
    buf.map_or(PCWSTR::null(), |b| PCWSTR(b.as_ptr()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_is_null_terminated() {
        assert_eq!(wide("ab"), vec![0x61, 0x62, 0]);
    }

    #[test]
    fn test_unicode_events_use_unicode_flag() {
        let (down, up) = unicode_events('a');
        assert_eq!(down.len(), 1);
        assert_eq!(up.len(), 1);
        // SAFETY: the union was written through the `ki` member.
        let (d, u) = unsafe { (down[0].Anonymous.ki, up[0].Anonymous.ki) };
        assert_eq!(d.wScan, u16::from(b'a'));
        assert_eq!(d.dwFlags, KEYEVENTF_UNICODE);
        assert_eq!(u.dwFlags, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP);
    }

    #[test]
    fn test_astral_char_is_sent_as_surrogate_pair() {
        let (down, _) = unicode_events('😀');
        assert_eq!(down.len(), 2);
    }

    #[test]
    fn test_navigation_keys_get_extended_flag() {
        let vk = named_key_vk("UP").unwrap();
        let (down, _) = vk_events(vk);
        // SAFETY: the union was written through the `ki` member.
        let ki = unsafe { down[0].Anonymous.ki };
        assert_eq!(ki.wVk, VIRTUAL_KEY(u16::from(vk)));
        assert!(ki.dwFlags.contains(KEYEVENTF_EXTENDEDKEY));
    }

    #[test]
    fn test_unknown_named_key_is_rejected_before_sending() {
        let result = SendInputSynthesizer.synthesize(
            &KeyStroke::Named("NOT_A_KEY".to_string()),
            KeyAction::Press,
        );
        assert!(matches!(result, Err(BackendError::InvalidKeyName(_))));
    }
}
