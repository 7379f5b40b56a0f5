//! Built-in fallback layout.
//!
//! Activated at compiler construction (something upstream may query the key
//! table before the first layout delivery arrives) and whenever a delivered
//! source fails to compile. A US-style layout is a lot more useful as a
//! fallback than an empty table.
//!
//! Keycodes are the X numbering (external button number + 8); keysym values
//! follow X11/keysymdef.h.

use std::collections::BTreeMap;

use super::compiled::{
    CompiledGroup, CompiledKey, CompiledLayout, CompiledLevel, ModAction, ModBehavior,
};

// Raw mask slots of the default layout's modifier table.
const SHIFT: u32 = 1 << 0;
const CAPS: u32 = 1 << 1;
const CONTROL: u32 = 1 << 2;
const MOD1: u32 = 1 << 3;
const MOD4: u32 = 1 << 4;
const NUM: u32 = 1 << 6;
const SCROLL: u32 = 1 << 7;

const DEFAULT_MOD_NAMES: [&str; 8] = [
    "Shift",
    "CapsLock",
    "Control",
    "Mod1",
    "Mod4",
    "Mod5",
    "NumLock",
    "ScrollLock",
];

/// Alphabetic rows: (keycode, base keysym, shifted keysym). Uppercase is
/// selected by Shift or by CapsLock.
const ALPHA_KEYS: &[(u32, u32, u32)] = &[
    (24, 0x71, 0x51),  // q
    (25, 0x77, 0x57),  // w
    (26, 0x65, 0x45),  // e
    (27, 0x72, 0x52),  // r
    (28, 0x74, 0x54),  // t
    (29, 0x79, 0x59),  // y
    (30, 0x75, 0x55),  // u
    (31, 0x69, 0x49),  // i
    (32, 0x6F, 0x4F),  // o
    (33, 0x70, 0x50),  // p
    (38, 0x61, 0x41),  // a
    (39, 0x73, 0x53),  // s
    (40, 0x64, 0x44),  // d
    (41, 0x66, 0x46),  // f
    (42, 0x67, 0x47),  // g
    (43, 0x68, 0x48),  // h
    (44, 0x6A, 0x4A),  // j
    (45, 0x6B, 0x4B),  // k
    (46, 0x6C, 0x4C),  // l
    (52, 0x7A, 0x5A),  // z
    (53, 0x78, 0x58),  // x
    (54, 0x63, 0x43),  // c
    (55, 0x76, 0x56),  // v
    (56, 0x62, 0x42),  // b
    (57, 0x6E, 0x4E),  // n
    (58, 0x6D, 0x4D),  // m
];

/// Digit and punctuation rows: (keycode, base keysym, shifted keysym).
/// Shifted level is selected by Shift only.
const SHIFTED_KEYS: &[(u32, u32, u32)] = &[
    (10, 0x31, 0x21), // 1 exclam
    (11, 0x32, 0x40), // 2 at
    (12, 0x33, 0x23), // 3 numbersign
    (13, 0x34, 0x24), // 4 dollar
    (14, 0x35, 0x25), // 5 percent
    (15, 0x36, 0x5E), // 6 asciicircum
    (16, 0x37, 0x26), // 7 ampersand
    (17, 0x38, 0x2A), // 8 asterisk
    (18, 0x39, 0x28), // 9 parenleft
    (19, 0x30, 0x29), // 0 parenright
    (20, 0x2D, 0x5F), // minus underscore
    (21, 0x3D, 0x2B), // equal plus
    (34, 0x5B, 0x7B), // bracketleft braceleft
    (35, 0x5D, 0x7D), // bracketright braceright
    (47, 0x3B, 0x3A), // semicolon colon
    (48, 0x27, 0x22), // apostrophe quotedbl
    (49, 0x60, 0x7E), // grave asciitilde
    (51, 0x5C, 0x7C), // backslash bar
    (59, 0x2C, 0x3C), // comma less
    (60, 0x2E, 0x3E), // period greater
    (61, 0x2F, 0x3F), // slash question
];

/// Single-level keys: (keycode, keysym).
const PLAIN_KEYS: &[(u32, u32)] = &[
    (9, 0xFF1B),   // Escape
    (22, 0xFF08),  // BackSpace
    (23, 0xFF09),  // Tab
    (36, 0xFF0D),  // Return
    (65, 0x20),    // space
    (67, 0xFFBE),  // F1
    (68, 0xFFBF),  // F2
    (69, 0xFFC0),  // F3
    (70, 0xFFC1),  // F4
    (71, 0xFFC2),  // F5
    (72, 0xFFC3),  // F6
    (73, 0xFFC4),  // F7
    (74, 0xFFC5),  // F8
    (75, 0xFFC6),  // F9
    (76, 0xFFC7),  // F10
    (95, 0xFFC8),  // F11
    (96, 0xFFC9),  // F12
    (110, 0xFF50), // Home
    (111, 0xFF52), // Up
    (112, 0xFF55), // Prior
    (113, 0xFF51), // Left
    (114, 0xFF53), // Right
    (115, 0xFF57), // End
    (116, 0xFF54), // Down
    (117, 0xFF56), // Next
    (118, 0xFF63), // Insert
    (119, 0xFFFF), // Delete
    (135, 0xFF67), // Menu
];

/// Modifier keys: (keycode, keysym, generated raw mask, lock behavior).
const MODIFIER_KEYS: &[(u32, u32, u32, bool)] = &[
    (50, 0xFFE1, SHIFT, false),    // Shift_L
    (62, 0xFFE2, SHIFT, false),    // Shift_R
    (37, 0xFFE3, CONTROL, false),  // Control_L
    (105, 0xFFE4, CONTROL, false), // Control_R
    (64, 0xFFE9, MOD1, false),     // Alt_L
    (108, 0xFFEA, MOD1, false),    // Alt_R
    (133, 0xFFEB, MOD4, false),    // Super_L
    (134, 0xFFEC, MOD4, false),    // Super_R
    (66, 0xFFE5, CAPS, true),      // Caps_Lock
    (77, 0xFF7F, NUM, true),       // Num_Lock
    (78, 0xFF14, SCROLL, true),    // Scroll_Lock
];

fn one_group(levels: Vec<CompiledLevel>) -> Vec<CompiledGroup> {
    vec![CompiledGroup { levels }]
}

impl CompiledLayout {
    /// The built-in US-style fallback layout.
    pub fn default_us() -> CompiledLayout {
        let mut keys = BTreeMap::new();

        for &(keycode, base, shifted) in ALPHA_KEYS {
            keys.insert(
                keycode,
                CompiledKey {
                    groups: one_group(vec![
                        CompiledLevel { syms: vec![base], masks: vec![0] },
                        CompiledLevel { syms: vec![shifted], masks: vec![SHIFT, CAPS] },
                    ]),
                    generates: None,
                    group_shift: None,
                },
            );
        }

        for &(keycode, base, shifted) in SHIFTED_KEYS {
            keys.insert(
                keycode,
                CompiledKey {
                    groups: one_group(vec![
                        CompiledLevel { syms: vec![base], masks: vec![0] },
                        CompiledLevel { syms: vec![shifted], masks: vec![SHIFT] },
                    ]),
                    generates: None,
                    group_shift: None,
                },
            );
        }

        for &(keycode, sym) in PLAIN_KEYS {
            keys.insert(
                keycode,
                CompiledKey {
                    groups: one_group(vec![CompiledLevel { syms: vec![sym], masks: vec![0] }]),
                    generates: None,
                    group_shift: None,
                },
            );
        }

        for &(keycode, sym, mask, lock) in MODIFIER_KEYS {
            let behavior = if lock { ModBehavior::Lock } else { ModBehavior::Set };
            keys.insert(
                keycode,
                CompiledKey {
                    groups: one_group(vec![CompiledLevel { syms: vec![sym], masks: vec![0] }]),
                    generates: Some(ModAction { mask, behavior }),
                    group_shift: None,
                },
            );
        }

        CompiledLayout::new(
            "us".to_string(),
            DEFAULT_MOD_NAMES.iter().map(|s| s.to_string()).collect(),
            keys,
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
