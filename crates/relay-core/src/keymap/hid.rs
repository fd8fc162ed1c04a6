//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page) for every abstract key.
//!
//! This is the `hid` preset: the keycodes a hardware key-injection device
//! expects.  Reference: USB HID Usage Tables 1.3, Section 10.
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The **USB Human Interface Device (HID)** standard assigns a unique number to
//! every key on a keyboard.  All keyboard keys are on usage page 0x07.
//!
//! | Key          | HID Usage ID |
//! |--------------|-------------|
//! | Letter A     | 0x04        |
//! | Enter        | 0x28        |
//! | Left Ctrl    | 0xE0        |
//!
//! HID codes represent **physical key positions**, not characters, so letters
//! start at 0x04 rather than at ASCII 'A' (0x41), and digit `0` (0x27) comes
//! after digit `9` (0x26) exactly as on the physical top row.
//!
//! Modifier keys live in the 0xE0–0xE7 range.  Hardware devices treat those
//! as bits in a modifier byte rather than as ordinary key slots.

use super::key::AbstractKey;

/// First HID usage ID of the modifier range (Left Ctrl).
pub const MODIFIER_FIRST: u8 = 0xE0;
/// Last HID usage ID of the modifier range (Right GUI).
pub const MODIFIER_LAST: u8 = 0xE7;

/// Returns `true` if `code` is a modifier usage (0xE0–0xE7).
#[inline]
pub fn is_modifier(code: u8) -> bool {
    (MODIFIER_FIRST..=MODIFIER_LAST).contains(&code)
}

/// Translates an abstract key to its HID usage ID.
///
/// Every abstract key has a HID equivalent, so this never fails.
pub fn hid_usage(key: AbstractKey) -> u8 {
    use AbstractKey::*;
    match key {
        // Letters (HID 0x04–0x1D)
        A => 0x04,
        B => 0x05,
        C => 0x06,
        D => 0x07,
        E => 0x08,
        F => 0x09,
        G => 0x0A,
        H => 0x0B,
        I => 0x0C,
        J => 0x0D,
        K => 0x0E,
        L => 0x0F,
        M => 0x10,
        N => 0x11,
        O => 0x12,
        P => 0x13,
        Q => 0x14,
        R => 0x15,
        S => 0x16,
        T => 0x17,
        U => 0x18,
        V => 0x19,
        W => 0x1A,
        X => 0x1B,
        Y => 0x1C,
        Z => 0x1D,

        // Digits (HID 0x1E–0x27, zero last)
        One => 0x1E,
        Two => 0x1F,
        Three => 0x20,
        Four => 0x21,
        Five => 0x22,
        Six => 0x23,
        Seven => 0x24,
        Eight => 0x25,
        Nine => 0x26,
        Zero => 0x27,

        // Function keys (HID 0x3A–0x45)
        F1 => 0x3A,
        F2 => 0x3B,
        F3 => 0x3C,
        F4 => 0x3D,
        F5 => 0x3E,
        F6 => 0x3F,
        F7 => 0x40,
        F8 => 0x41,
        F9 => 0x42,
        F10 => 0x43,
        F11 => 0x44,
        F12 => 0x45,

        // Navigation cluster
        Insert => 0x49,
        Home => 0x4A,
        PageUp => 0x4B,
        Delete => 0x4C,
        End => 0x4D,
        PageDown => 0x4E,
        Right => 0x4F,
        Left => 0x50,
        Down => 0x51,
        Up => 0x52,

        // Control and punctuation
        Enter => 0x28,
        Esc => 0x29,
        Space => 0x2C,
        Semicolon => 0x33,
        Quote => 0x34,
        Tilde => 0x35,
        Comma => 0x36,
        Period => 0x37,
        Slash => 0x38,

        // Modifiers (left-hand variants)
        Ctrl => 0xE0,
        Shift => 0xE1,
        Alt => 0xE2,
    }
}
