//! Symbolic key names for the synthetic keyboard backend (the `synthetic` preset).
//!
//! A synthesizer token is either a single character, which is typed as that
//! literal character, or a multi-character *named key* such as `ENTER` or
//! `VK_SHIFT`, which is resolved through [`super::windows_vk::named_key_vk`].
//!
//! Modifiers are given by their virtual-key names (`VK_CONTROL`, `VK_SHIFT`,
//! `VK_MENU`) rather than the one-character `^`, `+`, `%` shorthands, because
//! a single character would be typed literally on a press.

use super::key::AbstractKey;

/// Translates an abstract key to its default synthesizer token.
pub fn key_name(key: AbstractKey) -> &'static str {
    use AbstractKey::*;
    match key {
        A => "a",
        B => "b",
        C => "c",
        D => "d",
        E => "e",
        F => "f",
        G => "g",
        H => "h",
        I => "i",
        J => "j",
        K => "k",
        L => "l",
        M => "m",
        N => "n",
        O => "o",
        P => "p",
        Q => "q",
        R => "r",
        S => "s",
        T => "t",
        U => "u",
        V => "v",
        W => "w",
        X => "x",
        Y => "y",
        Z => "z",

        Zero => "0",
        One => "1",
        Two => "2",
        Three => "3",
        Four => "4",
        Five => "5",
        Six => "6",
        Seven => "7",
        Eight => "8",
        Nine => "9",

        F1 => "F1",
        F2 => "F2",
        F3 => "F3",
        F4 => "F4",
        F5 => "F5",
        F6 => "F6",
        F7 => "F7",
        F8 => "F8",
        F9 => "F9",
        F10 => "F10",
        F11 => "F11",
        F12 => "F12",

        Up => "UP",
        Down => "DOWN",
        Left => "LEFT",
        Right => "RIGHT",
        Home => "HOME",
        End => "END",
        PageUp => "PGUP",
        PageDown => "PGDN",
        Insert => "INSERT",
        Delete => "DEL",
        Esc => "ESC",
        Enter => "ENTER",
        Space => "SPACE",

        Ctrl => "VK_CONTROL",
        Shift => "VK_SHIFT",
        Alt => "VK_MENU",

        Tilde => "`",
        Quote => "'",
        Semicolon => ";",
        Comma => ",",
        Period => ".",
        Slash => "/",
    }
}
