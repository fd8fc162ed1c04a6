//! Named synthesizer keys to Windows Virtual Key (VK) code translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code",
//! defined in `<winuser.h>` as `VK_*` constants (e.g. `VK_RETURN = 0x0D`).
//! The synthetic backend names keys with short words such as `ENTER` or
//! `PGUP`, and also accepts the raw `VK_*` constant names.  This table turns
//! either spelling into the VK code handed to `SendInput`.
//!
//! Lookups ignore ASCII case, so `enter`, `Enter` and `ENTER` are the same key.

/// Complete name → VK mapping.  Several names may share one code.
const NAMED_KEYS: &[(&str, u8)] = &[
    // ── Editing and whitespace ───────────────────────────────────────────────
    ("ENTER", 0x0D),
    ("VK_RETURN", 0x0D),
    ("ESC", 0x1B),
    ("ESCAPE", 0x1B),
    ("VK_ESCAPE", 0x1B),
    ("SPACE", 0x20),
    ("VK_SPACE", 0x20),
    ("TAB", 0x09),
    ("VK_TAB", 0x09),
    ("BACKSPACE", 0x08),
    ("BKSP", 0x08),
    ("BS", 0x08),
    ("VK_BACK", 0x08),
    ("CAPSLOCK", 0x14),
    ("VK_CAPITAL", 0x14),
    // ── Navigation cluster ───────────────────────────────────────────────────
    ("PGUP", 0x21),
    ("VK_PRIOR", 0x21),
    ("PGDN", 0x22),
    ("VK_NEXT", 0x22),
    ("END", 0x23),
    ("VK_END", 0x23),
    ("HOME", 0x24),
    ("VK_HOME", 0x24),
    ("LEFT", 0x25),
    ("VK_LEFT", 0x25),
    ("UP", 0x26),
    ("VK_UP", 0x26),
    ("RIGHT", 0x27),
    ("VK_RIGHT", 0x27),
    ("DOWN", 0x28),
    ("VK_DOWN", 0x28),
    ("INSERT", 0x2D),
    ("INS", 0x2D),
    ("VK_INSERT", 0x2D),
    ("DEL", 0x2E),
    ("DELETE", 0x2E),
    ("VK_DELETE", 0x2E),
    // ── Modifiers ────────────────────────────────────────────────────────────
    ("VK_SHIFT", 0x10),
    ("VK_CONTROL", 0x11),
    ("VK_MENU", 0x12),
    ("VK_LSHIFT", 0xA0),
    ("VK_RSHIFT", 0xA1),
    ("VK_LCONTROL", 0xA2),
    ("VK_RCONTROL", 0xA3),
    ("VK_LMENU", 0xA4),
    ("VK_RMENU", 0xA5),
    ("VK_LWIN", 0x5B),
    ("VK_RWIN", 0x5C),
    // ── Function keys ────────────────────────────────────────────────────────
    ("F1", 0x70),
    ("F2", 0x71),
    ("F3", 0x72),
    ("F4", 0x73),
    ("F5", 0x74),
    ("F6", 0x75),
    ("F7", 0x76),
    ("F8", 0x77),
    ("F9", 0x78),
    ("F10", 0x79),
    ("F11", 0x7A),
    ("F12", 0x7B),
    // ── Locks and system ─────────────────────────────────────────────────────
    ("PRTSC", 0x2C),
    ("VK_SNAPSHOT", 0x2C),
    ("SCROLLLOCK", 0x91),
    ("VK_SCROLL", 0x91),
    ("NUMLOCK", 0x90),
    ("VK_NUMLOCK", 0x90),
    ("BREAK", 0x13),
    ("VK_PAUSE", 0x13),
];

/// Translates a named key to a Windows Virtual Key code.
///
/// Returns `None` if `name` is not a known named key.  Single characters are
/// not named keys; they are typed literally.
pub fn named_key_vk(name: &str) -> Option<u8> {
    // Linear scan: the table is small and only consulted once per synthesized stroke.
    NAMED_KEYS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, vk)| vk)
}

/// Returns `true` for VKs that must be injected with the extended-key flag
/// (navigation cluster, Windows keys, right-hand Ctrl/Alt).
pub fn is_extended_vk(vk: u8) -> bool {
    matches!(
        vk,
        0x21..=0x28 | 0x2D | 0x2E | 0x5B | 0x5C | 0xA3 | 0xA5
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_key_lookup_ignores_case() {
        assert_eq!(named_key_vk("ENTER"), Some(0x0D));
        assert_eq!(named_key_vk("enter"), Some(0x0D));
        assert_eq!(named_key_vk("Vk_Space"), Some(0x20));
    }

    #[test]
    fn test_function_keys_are_contiguous() {
        for n in 1..=12u8 {
            assert_eq!(named_key_vk(&format!("F{n}")), Some(0x6F + n));
        }
    }

    #[test]
    fn test_unknown_name_returns_none() {
        assert_eq!(named_key_vk("ENTERR"), None);
        assert_eq!(named_key_vk("a"), None);
    }

    #[test]
    fn test_arrows_are_extended() {
        assert!(is_extended_vk(named_key_vk("UP").unwrap()));
        assert!(is_extended_vk(named_key_vk("DEL").unwrap()));
        assert!(!is_extended_vk(named_key_vk("ENTER").unwrap()));
    }
}
