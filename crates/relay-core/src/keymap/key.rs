//! The closed set of abstract keys a caller may name.
//!
//! An [`AbstractKey`] is the only vocabulary the remote controller uses.  Its
//! numeric value is what travels in `KeyRequest.key` on the wire, so the
//! discriminants below are part of the protocol and must never be reordered.
//!
//! | Range  | Keys                      |
//! |--------|---------------------------|
//! | 0–25   | `A`–`Z`                   |
//! | 26–35  | `Zero`–`Nine`             |
//! | 36–47  | `F1`–`F12`                |
//! | 48–57  | arrows and navigation     |
//! | 58–69  | modifiers and punctuation |

use std::fmt;
use std::str::FromStr;

use super::MappingError;

/// Backend-independent key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum AbstractKey {
    // Letters
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
    I = 8,
    J = 9,
    K = 10,
    L = 11,
    M = 12,
    N = 13,
    O = 14,
    P = 15,
    Q = 16,
    R = 17,
    S = 18,
    T = 19,
    U = 20,
    V = 21,
    W = 22,
    X = 23,
    Y = 24,
    Z = 25,

    // Digits
    Zero = 26,
    One = 27,
    Two = 28,
    Three = 29,
    Four = 30,
    Five = 31,
    Six = 32,
    Seven = 33,
    Eight = 34,
    Nine = 35,

    // Function keys
    F1 = 36,
    F2 = 37,
    F3 = 38,
    F4 = 39,
    F5 = 40,
    F6 = 41,
    F7 = 42,
    F8 = 43,
    F9 = 44,
    F10 = 45,
    F11 = 46,
    F12 = 47,

    // Arrows and navigation
    Up = 48,
    Down = 49,
    Left = 50,
    Right = 51,
    Home = 52,
    End = 53,
    PageUp = 54,
    PageDown = 55,
    Insert = 56,
    Delete = 57,

    // Modifiers and special characters
    Ctrl = 58,
    Enter = 59,
    Space = 60,
    Tilde = 61,
    Quote = 62,
    Semicolon = 63,
    Comma = 64,
    Period = 65,
    Slash = 66,
    Esc = 67,
    Shift = 68,
    Alt = 69,
}

impl AbstractKey {
    /// Number of keys in the enumeration.
    pub const COUNT: usize = 70;

    /// Every key, ordered by wire value.  `ALL[k as usize] == k` holds for all keys.
    pub const ALL: [AbstractKey; Self::COUNT] = {
        use AbstractKey::*;
        [
            A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z, Zero,
            One, Two, Three, Four, Five, Six, Seven, Eight, Nine, F1, F2, F3, F4, F5, F6, F7,
            F8, F9, F10, F11, F12, Up, Down, Left, Right, Home, End, PageUp, PageDown, Insert,
            Delete, Ctrl, Enter, Space, Tilde, Quote, Semicolon, Comma, Period, Slash, Esc,
            Shift, Alt,
        ]
    };

    /// Position of this key in [`AbstractKey::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as i32 as usize
    }

    /// Canonical name, as used in configuration files.
    pub fn name(self) -> &'static str {
        use AbstractKey::*;
        match self {
            A => "A",
            B => "B",
            C => "C",
            D => "D",
            E => "E",
            F => "F",
            G => "G",
            H => "H",
            I => "I",
            J => "J",
            K => "K",
            L => "L",
            M => "M",
            N => "N",
            O => "O",
            P => "P",
            Q => "Q",
            R => "R",
            S => "S",
            T => "T",
            U => "U",
            V => "V",
            W => "W",
            X => "X",
            Y => "Y",
            Z => "Z",
            Zero => "Zero",
            One => "One",
            Two => "Two",
            Three => "Three",
            Four => "Four",
            Five => "Five",
            Six => "Six",
            Seven => "Seven",
            Eight => "Eight",
            Nine => "Nine",
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
            Up => "Up",
            Down => "Down",
            Left => "Left",
            Right => "Right",
            Home => "Home",
            End => "End",
            PageUp => "PageUp",
            PageDown => "PageDown",
            Insert => "Insert",
            Delete => "Delete",
            Ctrl => "Ctrl",
            Enter => "Enter",
            Space => "Space",
            Tilde => "Tilde",
            Quote => "Quote",
            Semicolon => "Semicolon",
            Comma => "Comma",
            Period => "Period",
            Slash => "Slash",
            Esc => "Esc",
            Shift => "Shift",
            Alt => "Alt",
        }
    }
}

impl TryFrom<i32> for AbstractKey {
    type Error = MappingError;

    /// Converts a wire value into a key.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidKeyValue`] for values outside `0..COUNT`.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(MappingError::InvalidKeyValue(value))
    }
}

impl From<AbstractKey> for i32 {
    fn from(key: AbstractKey) -> Self {
        key as i32
    }
}

impl FromStr for AbstractKey {
    type Err = MappingError;

    /// Parses a canonical key name, ignoring ASCII case (`"pageup"` → `PageUp`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MappingError::UnknownKeyName(s.to_string()))
    }
}

impl fmt::Display for AbstractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
