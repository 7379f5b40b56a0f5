//! Canonical modifier vocabulary and native-name normalization.
//!
//! Both ends of a KeyBridge session may run different platforms with
//! different keyboard layouts, and native layouts report the same logical
//! modifier under conflicting real and virtual names (a layout may call Alt
//! `Mod1`, `Alt`, or both). This module fixes a small, platform-neutral
//! vocabulary of nine modifiers and classifies every native name into it, so
//! the capture and injection sides can agree on masks instead of
//! vendor-specific strings.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One canonical, platform-neutral modifier.
///
/// The discriminant is the bit position inside [`ModifierMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ModifierBit {
    Shift = 0,
    CapsLock = 1,
    Control = 2,
    Alt = 3,
    Super = 4,
    AltGr = 5,
    Level5Lock = 6,
    NumLock = 7,
    ScrollLock = 8,
}

impl ModifierBit {
    /// All canonical modifiers, in bit-position order.
    pub const ALL: [ModifierBit; 9] = [
        ModifierBit::Shift,
        ModifierBit::CapsLock,
        ModifierBit::Control,
        ModifierBit::Alt,
        ModifierBit::Super,
        ModifierBit::AltGr,
        ModifierBit::Level5Lock,
        ModifierBit::NumLock,
        ModifierBit::ScrollLock,
    ];

    /// Returns the single-bit mask for this modifier.
    pub fn mask(self) -> ModifierMask {
        ModifierMask(1 << self as u16)
    }

    /// Returns the canonical display name of this modifier.
    pub fn name(self) -> &'static str {
        match self {
            ModifierBit::Shift => "Shift",
            ModifierBit::CapsLock => "CapsLock",
            ModifierBit::Control => "Control",
            ModifierBit::Alt => "Alt",
            ModifierBit::Super => "Super",
            ModifierBit::AltGr => "AltGr",
            ModifierBit::Level5Lock => "Level5Lock",
            ModifierBit::NumLock => "NumLock",
            ModifierBit::ScrollLock => "ScrollLock",
        }
    }
}

/// A set of canonical modifiers, one bit per [`ModifierBit`].
///
/// Follows the flags-newtype pattern used for wire types elsewhere in
/// KeyBridge: a transparent integer with named accessors, cheap to copy and
/// to serialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierMask(pub u16);

impl ModifierMask {
    /// The empty set.
    pub const EMPTY: ModifierMask = ModifierMask(0);

    /// Returns `true` if no modifier bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if `bit` is set.
    pub fn contains(self, bit: ModifierBit) -> bool {
        self.0 & bit.mask().0 != 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    pub fn contains_all(self, other: ModifierMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets `bit`.
    pub fn insert(&mut self, bit: ModifierBit) {
        self.0 |= bit.mask().0;
    }

    /// Clears `bit`.
    pub fn remove(&mut self, bit: ModifierBit) {
        self.0 &= !bit.mask().0;
    }

    /// Returns the set with `bit` set.
    pub fn with(self, bit: ModifierBit) -> ModifierMask {
        ModifierMask(self.0 | bit.mask().0)
    }

    /// Returns the set with `bit` cleared.
    pub fn without(self, bit: ModifierBit) -> ModifierMask {
        ModifierMask(self.0 & !bit.mask().0)
    }

    /// Iterates over the modifiers present in this set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = ModifierBit> {
        ModifierBit::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl BitOr for ModifierMask {
    type Output = ModifierMask;

    fn bitor(self, rhs: ModifierMask) -> ModifierMask {
        ModifierMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierMask {
    fn bitor_assign(&mut self, rhs: ModifierMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        let mut first = true;
        for bit in self.iter() {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(bit.name())?;
            first = false;
        }
        Ok(())
    }
}

/// Classification of one native modifier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModClass {
    /// The name maps to a canonical modifier.
    Bit(ModifierBit),
    /// A known spare or ambiguous slot, deliberately dropped from masks.
    Ignored,
    /// A name the table does not cover; dropped from masks, but worth a
    /// warning so the table can be extended.
    Unknown,
}

/// Pure name→class table, no logging. Exact, case-sensitive comparison.
///
/// Covers both the real modifier slots and the virtual aliases that layouts
/// may report for the same logical modifier: `Mod1` and `Alt` both mean Alt,
/// `Logo`/`Mod4`/`Super`/`Hyper` all select the logo key.
pub(crate) fn lookup(name: &str) -> ModClass {
    match name {
        "Shift" => ModClass::Bit(ModifierBit::Shift),
        "CapsLock" => ModClass::Bit(ModifierBit::CapsLock),
        "Control" => ModClass::Bit(ModifierBit::Control),
        "Alt" | "Mod1" => ModClass::Bit(ModifierBit::Alt),
        // Hyper is virtual and often mapped onto the caps-lock position, but
        // it shares the logo key's slot on every layout we have seen.
        "Logo" | "Mod4" | "Super" | "Hyper" => ModClass::Bit(ModifierBit::Super),
        "Mod5" | "LevelThree" => ModClass::Bit(ModifierBit::AltGr),
        "LevelFive" => ModClass::Bit(ModifierBit::Level5Lock),
        "NumLock" => ModClass::Bit(ModifierBit::NumLock),
        "ScrollLock" => ModClass::Bit(ModifierBit::ScrollLock),
        // Meta is usually encoded like Alt and shares its state; Mod2 and
        // Mod3 are spare slots (Mod2 frequently carries num lock).
        "Meta" | "Mod2" | "Mod3" => ModClass::Ignored,
        _ => ModClass::Unknown,
    }
}

/// Classifies a native modifier name into the canonical vocabulary.
///
/// Never fails: names the table does not cover classify as
/// [`ModClass::Unknown`] and are logged at warning level so they cannot
/// silently corrupt a mask; known-spare slots classify as
/// [`ModClass::Ignored`] with a debug-level log only.
pub fn classify(name: &str) -> ModClass {
    let class = lookup(name);
    match class {
        ModClass::Ignored => debug!("modifier name {name} ignored"),
        ModClass::Unknown => warn!("modifier name {name} not accounted for"),
        ModClass::Bit(_) => {}
    }
    class
}

// ── Tests ─────────────────────────────────────────────────────────────────────
