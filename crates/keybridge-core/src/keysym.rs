//! Native keysym to canonical key identity translation.
//!
//! [`KeyId`] is the platform-neutral key identity used throughout KeyBridge:
//! the capture side resolves native keysyms into it, the injection side maps
//! it back to whatever its platform synthesizes. Printable symbols carry
//! their character directly so 'a' and 'A' stay distinct entries in the key
//! table (which entry applies is decided by the required-modifier mask, not
//! by the identity).
//!
//! Keysym values follow X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h

use serde::{Deserialize, Serialize};

/// Keysyms at or above this value encode a Unicode code point in their low
/// 24 bits.
const UNICODE_KEYSYM_FLAG: u32 = 0x0100_0000;

/// Canonical, keysym-independent key identity.
///
/// [`KeyId::Unknown`] is the sentinel for symbols with no canonical mapping;
/// entries carrying it are still emitted so the receiver can decide what to
/// do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyId {
    /// A printable symbol, including space and all letters/digits/punctuation.
    Char(char),

    // Editing keys
    Enter,
    Escape,
    Backspace,
    Tab,
    Insert,
    Delete,

    // Navigation keys
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Modifier keys
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    SuperLeft,
    SuperRight,
    CapsLock,
    NumLock,
    ScrollLock,

    Menu,

    /// A symbol with no canonical mapping.
    Unknown,
}

/// Translates a native keysym to its canonical [`KeyId`].
///
/// Returns [`KeyId::Unknown`] for keysyms with no canonical equivalent.
pub fn keysym_to_key_id(keysym: u32) -> KeyId {
    // Printable Latin-1 ranges: keysym value == character code.
    if (0x20..=0x7E).contains(&keysym) || (0xA0..=0xFF).contains(&keysym) {
        return match char::from_u32(keysym) {
            Some(c) => KeyId::Char(c),
            None => KeyId::Unknown,
        };
    }

    // Unicode-flagged keysyms carry the code point directly.
    if keysym >= UNICODE_KEYSYM_FLAG {
        return match char::from_u32(keysym & 0x00FF_FFFF) {
            Some(c) => KeyId::Char(c),
            None => KeyId::Unknown,
        };
    }

    // Keypad digits resolve to their character equivalents; the distinction
    // between main-row and keypad input is carried by the button, not the id.
    if (0xFFB0..=0xFFB9).contains(&keysym) {
        return KeyId::Char((b'0' + (keysym - 0xFFB0) as u8) as char);
    }

    match keysym {
        0xFF0D => KeyId::Enter,     // XK_Return
        0xFF1B => KeyId::Escape,    // XK_Escape
        0xFF08 => KeyId::Backspace, // XK_BackSpace
        0xFF09 => KeyId::Tab,       // XK_Tab
        0xFF63 => KeyId::Insert,    // XK_Insert
        0xFFFF => KeyId::Delete,    // XK_Delete

        0xFF50 => KeyId::Home,       // XK_Home
        0xFF57 => KeyId::End,        // XK_End
        0xFF55 => KeyId::PageUp,     // XK_Prior
        0xFF56 => KeyId::PageDown,   // XK_Next
        0xFF51 => KeyId::ArrowLeft,  // XK_Left
        0xFF52 => KeyId::ArrowUp,    // XK_Up
        0xFF53 => KeyId::ArrowRight, // XK_Right
        0xFF54 => KeyId::ArrowDown,  // XK_Down

        0xFFBE => KeyId::F1, // XK_F1
        0xFFBF => KeyId::F2,
        0xFFC0 => KeyId::F3,
        0xFFC1 => KeyId::F4,
        0xFFC2 => KeyId::F5,
        0xFFC3 => KeyId::F6,
        0xFFC4 => KeyId::F7,
        0xFFC5 => KeyId::F8,
        0xFFC6 => KeyId::F9,
        0xFFC7 => KeyId::F10,
        0xFFC8 => KeyId::F11,
        0xFFC9 => KeyId::F12, // XK_F12

        0xFFE1 => KeyId::ShiftLeft,    // XK_Shift_L
        0xFFE2 => KeyId::ShiftRight,   // XK_Shift_R
        0xFFE3 => KeyId::ControlLeft,  // XK_Control_L
        0xFFE4 => KeyId::ControlRight, // XK_Control_R
        0xFFE9 => KeyId::AltLeft,      // XK_Alt_L
        0xFFEA => KeyId::AltRight,     // XK_Alt_R
        0xFFEB => KeyId::SuperLeft,    // XK_Super_L
        0xFFEC => KeyId::SuperRight,   // XK_Super_R
        0xFFE5 => KeyId::CapsLock,     // XK_Caps_Lock
        0xFF7F => KeyId::NumLock,      // XK_Num_Lock
        0xFF14 => KeyId::ScrollLock,   // XK_Scroll_Lock

        0xFF67 => KeyId::Menu, // XK_Menu

        // Keypad editing/navigation aliases
        0xFF8D => KeyId::Enter,    // XK_KP_Enter
        0xFF95 => KeyId::Home,     // XK_KP_Home
        0xFF9C => KeyId::End,      // XK_KP_End
        0xFF9A => KeyId::PageUp,   // XK_KP_Prior
        0xFF9B => KeyId::PageDown, // XK_KP_Next
        0xFF9E => KeyId::Insert,   // XK_KP_Insert
        0xFF9F => KeyId::Delete,   // XK_KP_Delete
        0xFFAA => KeyId::Char('*'), // XK_KP_Multiply
        0xFFAB => KeyId::Char('+'), // XK_KP_Add
        0xFFAD => KeyId::Char('-'), // XK_KP_Subtract
        0xFFAE => KeyId::Char('.'), // XK_KP_Decimal
        0xFFAF => KeyId::Char('/'), // XK_KP_Divide

        _ => KeyId::Unknown,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
