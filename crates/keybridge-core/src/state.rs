//! Live modifier and group state bound to one compiled layout.
//!
//! A tracker follows the platform state model: three modifier components —
//! *depressed* (held right now), *latched* (applies to the next non-modifier
//! press, then consumed), *locked* (toggled, survives release) — plus a
//! locked group. The *effective* component, which is what level resolution
//! and polling use, is the union of the three.
//!
//! Two kinds of tracker exist at runtime, with identical code: the live
//! tracker owned by the compiler and driven by incoming physical key events,
//! and throwaway instances the key-table builder creates to observe which
//! modifiers a simulated press generates. Neither kind ever rebinds: a
//! tracker is replaced, not mutated, when its layout is superseded.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::keysym::{keysym_to_key_id, KeyId};
use crate::layout::compiled::{CompiledLayout, ModBehavior, KEYCODE_OFFSET};
use crate::modifier::ModifierMask;

/// Which internal component a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateComponent {
    Depressed,
    Latched,
    Locked,
    Effective,
}

/// Components changed by one key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct StateChange(u8);

impl StateChange {
    pub(crate) const DEPRESSED: u8 = 1 << 0;
    pub(crate) const LATCHED: u8 = 1 << 1;
    pub(crate) const LOCKED: u8 = 1 << 2;
    pub(crate) const EFFECTIVE: u8 = 1 << 3;
    pub(crate) const GROUP: u8 = 1 << 4;

    pub(crate) fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn contains(self, component: u8) -> bool {
        self.0 & component != 0
    }
}

/// Mutable modifier/group state for one [`CompiledLayout`].
#[derive(Debug, Clone)]
pub struct ModifierStateTracker {
    layout: Arc<CompiledLayout>,
    depressed: u32,
    latched: u32,
    locked: u32,
    locked_group: u32,
}

impl ModifierStateTracker {
    /// Creates a tracker bound to `layout`, with no modifiers active and the
    /// base group selected.
    pub fn new(layout: Arc<CompiledLayout>) -> Self {
        Self {
            layout,
            depressed: 0,
            latched: 0,
            locked: 0,
            locked_group: 0,
        }
    }

    /// The layout this tracker is bound to.
    pub fn layout(&self) -> &Arc<CompiledLayout> {
        &self.layout
    }

    /// Applies one physical key transition, identified by its external
    /// button number.
    pub fn update_state(&mut self, button: u32, pressed: bool) {
        self.update_keycode(button + KEYCODE_OFFSET, pressed);
    }

    /// Applies one transition by native keycode, reporting which components
    /// changed. Keycodes the layout does not know leave the state untouched.
    pub(crate) fn update_keycode(&mut self, keycode: u32, pressed: bool) -> StateChange {
        let before = (
            self.depressed,
            self.latched,
            self.locked,
            self.effective_raw(),
            self.locked_group,
        );

        let (generates, group_shift) = match self.layout.key(keycode) {
            Some(key) => (key.generates, key.group_shift),
            None => return StateChange::default(),
        };

        if pressed {
            match generates {
                Some(action) => {
                    if action.behavior == ModBehavior::Lock {
                        self.locked ^= action.mask;
                    }
                    self.depressed |= action.mask;
                }
                // A non-modifier press consumes any pending latch.
                None => self.latched = 0,
            }
            if let Some(delta) = group_shift {
                self.locked_group = wrap_group(self.locked_group, delta, self.layout.num_groups());
            }
        } else if let Some(action) = generates {
            self.depressed &= !action.mask;
            if action.behavior == ModBehavior::Latch {
                self.latched |= action.mask;
            }
        }

        let after = (
            self.depressed,
            self.latched,
            self.locked,
            self.effective_raw(),
            self.locked_group,
        );
        let mut bits = 0u8;
        if before.0 != after.0 {
            bits |= StateChange::DEPRESSED;
        }
        if before.1 != after.1 {
            bits |= StateChange::LATCHED;
        }
        if before.2 != after.2 {
            bits |= StateChange::LOCKED;
        }
        if before.3 != after.3 {
            bits |= StateChange::EFFECTIVE;
        }
        if before.4 != after.4 {
            bits |= StateChange::GROUP;
        }
        StateChange(bits)
    }

    /// Raw (layout-local) mask of one component.
    pub fn serialize_mods(&self, component: StateComponent) -> u32 {
        match component {
            StateComponent::Depressed => self.depressed,
            StateComponent::Latched => self.latched,
            StateComponent::Locked => self.locked,
            StateComponent::Effective => self.effective_raw(),
        }
    }

    /// Whether one raw modifier slot is active in the given component.
    pub fn mod_index_is_active(&self, index: u32, component: StateComponent) -> bool {
        self.serialize_mods(component) & (1 << index) != 0
    }

    /// Current effective modifiers in the canonical vocabulary.
    pub fn poll_active_modifiers(&self) -> ModifierMask {
        self.layout.normalize_mask(self.effective_raw())
    }

    /// Current effective layout group.
    pub fn poll_active_group(&self) -> u32 {
        self.locked_group
    }

    /// Resolves the single symbol currently active for `button` under this
    /// tracker's state.
    ///
    /// Level selection matches the effective mask, restricted to the raw
    /// bits the key's level table mentions, against each level's selecting
    /// combinations; with no exact match the base level stands. A level
    /// resolving to more than one symbol logs a warning and uses the first.
    pub fn map_symbol(&self, button: u32) -> KeyId {
        let keycode = button + KEYCODE_OFFSET;
        let Some(key) = self.layout.key(keycode) else {
            debug!("button {button} has no entry in layout {:?}", self.layout.name());
            return KeyId::Unknown;
        };
        let Some(group_index) = key.resolve_group(self.locked_group) else {
            return KeyId::Unknown;
        };
        let group = &key.groups[group_index];

        let relevant: u32 = group
            .levels
            .iter()
            .flat_map(|level| level.masks.iter())
            .fold(0, |acc, mask| acc | mask);
        let active = self.effective_raw() & relevant;

        let level_index = group
            .levels
            .iter()
            .position(|level| level.masks.iter().any(|&mask| mask == active))
            .unwrap_or(0);
        let Some(level) = group.levels.get(level_index) else {
            return KeyId::Unknown;
        };

        match level.syms.as_slice() {
            [] => KeyId::Unknown,
            [sym] => keysym_to_key_id(*sym),
            [sym, ..] => {
                warn!("multiple keysyms for button {button}, using the first");
                keysym_to_key_id(*sym)
            }
        }
    }

    fn effective_raw(&self) -> u32 {
        self.depressed | self.latched | self.locked
    }
}

fn wrap_group(current: u32, delta: i32, num_groups: u32) -> u32 {
    let n = i64::from(num_groups.max(1));
    (i64::from(current) + i64::from(delta)).rem_euclid(n) as u32
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::source::compile_source;
    use crate::modifier::ModifierBit;

    /// Two groups, a letter key, a Shift key, a latching Shift, a locking
    /// CapsLock, and a group-switch key.
    const TRACKER_LAYOUT: &str = r#"{
        "name": "tracker-test",
        "modifiers": ["Shift", "CapsLock"],
        "keys": [
            { "keycode": 38,
              "groups": [
                { "levels": [
                    { "syms": [97], "masks": [[]] },
                    { "syms": [65], "masks": [["Shift"], ["CapsLock"]] }
                ] },
                { "levels": [ { "syms": [233], "masks": [[]] } ] }
              ] },
            { "keycode": 50,
              "groups": [ { "levels": [ { "syms": [65505], "masks": [[]] } ] } ],
              "generates": { "modifiers": ["Shift"] } },
            { "keycode": 51,
              "groups": [ { "levels": [ { "syms": [65505], "masks": [[]] } ] } ],
              "generates": { "modifiers": ["Shift"], "behavior": "latch" } },
            { "keycode": 66,
              "groups": [ { "levels": [ { "syms": [65509], "masks": [[]] } ] } ],
              "generates": { "modifiers": ["CapsLock"], "behavior": "lock" } },
            { "keycode": 100,
              "groups": [ { "levels": [ { "syms": [65406], "masks": [[]] } ] } ],
              "group_shift": 1 }
        ]
    }"#;

    fn tracker() -> ModifierStateTracker {
        let layout = compile_source(TRACKER_LAYOUT).expect("layout must compile");
        ModifierStateTracker::new(Arc::new(layout))
    }

    #[test]
    fn test_set_modifier_active_while_held_only() {
        let mut t = tracker();

        t.update_keycode(50, true);
        assert!(t.poll_active_modifiers().contains(ModifierBit::Shift));

        t.update_keycode(50, false);
        assert_eq!(t.poll_active_modifiers(), ModifierMask::EMPTY);
    }

    #[test]
    fn test_lock_modifier_survives_release_and_toggles_off() {
        let mut t = tracker();

        t.update_keycode(66, true);
        t.update_keycode(66, false);
        assert!(t.poll_active_modifiers().contains(ModifierBit::CapsLock));
        assert!(t.mod_index_is_active(1, StateComponent::Locked));
        assert!(!t.mod_index_is_active(1, StateComponent::Depressed));

        t.update_keycode(66, true);
        t.update_keycode(66, false);
        assert_eq!(t.poll_active_modifiers(), ModifierMask::EMPTY);
    }

    #[test]
    fn test_latch_applies_to_next_press_then_consumed() {
        let mut t = tracker();

        t.update_keycode(51, true);
        t.update_keycode(51, false);
        assert!(t.mod_index_is_active(0, StateComponent::Latched));
        assert!(t.poll_active_modifiers().contains(ModifierBit::Shift));

        // The latched Shift shapes this press...
        assert_eq!(t.map_symbol(38 - 8), KeyId::Char('A'));
        // ...and the press consumes it.
        t.update_keycode(38, true);
        t.update_keycode(38, false);
        assert_eq!(t.poll_active_modifiers(), ModifierMask::EMPTY);
        assert_eq!(t.map_symbol(38 - 8), KeyId::Char('a'));
    }

    #[test]
    fn test_group_switch_changes_active_group_with_wraparound() {
        let mut t = tracker();
        assert_eq!(t.poll_active_group(), 0);

        t.update_keycode(100, true);
        t.update_keycode(100, false);
        assert_eq!(t.poll_active_group(), 1);

        t.update_keycode(100, true);
        t.update_keycode(100, false);
        assert_eq!(t.poll_active_group(), 0);
    }

    #[test]
    fn test_map_symbol_follows_active_group() {
        let mut t = tracker();
        assert_eq!(t.map_symbol(30), KeyId::Char('a'));

        t.update_keycode(100, true);
        t.update_keycode(100, false);
        assert_eq!(t.map_symbol(30), KeyId::Char('é'));
    }

    #[test]
    fn test_map_symbol_uppercase_under_locked_caps() {
        let mut t = tracker();
        t.update_keycode(66, true);
        t.update_keycode(66, false);

        assert_eq!(t.map_symbol(30), KeyId::Char('A'));
    }

    #[test]
    fn test_map_symbol_shift_plus_caps_cancels_to_base_level() {
        let mut t = tracker();
        t.update_keycode(66, true);
        t.update_keycode(66, false);
        t.update_keycode(50, true);

        // Shift+CapsLock matches no selecting combination; base level stands.
        assert_eq!(t.map_symbol(30), KeyId::Char('a'));
    }

    #[test]
    fn test_map_symbol_unknown_button_is_unknown() {
        let t = tracker();
        assert_eq!(t.map_symbol(999), KeyId::Unknown);
    }

    #[test]
    fn test_map_symbol_multiple_syms_uses_first() {
        let layout = compile_source(
            r#"{
                "modifiers": [],
                "keys": [
                    { "keycode": 38,
                      "groups": [ { "levels": [ { "syms": [97, 98], "masks": [[]] } ] } ] }
                ]
            }"#,
        )
        .expect("layout must compile");
        let t = ModifierStateTracker::new(Arc::new(layout));

        assert_eq!(t.map_symbol(30), KeyId::Char('a'));
    }

    #[test]
    fn test_update_state_uses_external_button_numbering() {
        let mut t = tracker();

        // Shift key is keycode 50, button 42.
        t.update_state(42, true);
        assert!(t.poll_active_modifiers().contains(ModifierBit::Shift));
        t.update_state(42, false);
        assert!(t.poll_active_modifiers().is_empty());
    }

    #[test]
    fn test_unknown_keycode_changes_nothing() {
        let mut t = tracker();
        let change = t.update_keycode(999, true);
        assert!(change.is_empty());
        assert_eq!(t.poll_active_modifiers(), ModifierMask::EMPTY);
    }

    #[test]
    fn test_update_keycode_reports_changed_components() {
        let mut t = tracker();

        let change = t.update_keycode(66, true);
        assert!(change.contains(StateChange::LOCKED));
        assert!(change.contains(StateChange::DEPRESSED));
        assert!(change.contains(StateChange::EFFECTIVE));

        let change = t.update_keycode(100, true);
        assert!(change.contains(StateChange::GROUP));
        assert!(!change.contains(StateChange::LOCKED));
    }
}
