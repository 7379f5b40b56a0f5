//! Canonical key table.
//!
//! The [`KeyMap`] is what the two ends of a session exchange their keyboard
//! knowledge through: for every physical key, which symbol it produces, which
//! canonical modifiers must or may be held to select that symbol, and which
//! modifiers the key itself generates. It is built once per layout delivery
//! by [`KeyTableBuilder`](builder::KeyTableBuilder) and consumed by the
//! platform injection layer on the other machine.

pub mod builder;

use serde::{Deserialize, Serialize};

use crate::keysym::KeyId;
use crate::modifier::ModifierMask;

/// One canonical key-table entry.
///
/// Several entries may share one `button`+`group` when the key produces
/// different symbols at different modifier combinations, or when Shift and
/// CapsLock are interchangeable for its case selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyItem {
    /// Canonical symbolic identity of what this entry produces.
    pub id: KeyId,
    /// Physical key in the external numbering space (native keycode − 8).
    pub button: u32,
    /// Layout group this entry belongs to.
    pub group: u32,
    /// Every modifier that can influence which symbol this key produces at
    /// this group/level.
    pub sensitive: ModifierMask,
    /// The subset of `sensitive` that must be held to reach this entry.
    pub required: ModifierMask,
    /// Modifiers this key itself generates when pressed.
    pub generated: ModifierMask,
    /// Whether pressing this key latches a modifier into a locked state.
    pub locks_modifier: bool,
}

/// An ordered collection of [`KeyItem`]s plus the compose policy flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    entries: Vec<KeyItem>,
    compose_across_groups: bool,
}

impl KeyMap {
    /// Creates an empty key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    pub fn add_entry(&mut self, item: KeyItem) {
        self.entries.push(item);
    }

    /// All entries, in builder emission order.
    pub fn entries(&self) -> &[KeyItem] {
        &self.entries
    }

    /// Entries for one physical button, across groups and levels.
    pub fn entries_for_button(&self, button: u32) -> impl Iterator<Item = &KeyItem> {
        self.entries.iter().filter(move |item| item.button == button)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether symbol composition (dead-key sequences) may continue across a
    /// group switch.
    pub fn compose_across_groups(&self) -> bool {
        self.compose_across_groups
    }

    /// Allows composition to continue across group switches.
    pub fn allow_group_switch_during_compose(&mut self) {
        self.compose_across_groups = true;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierBit;

    fn item(button: u32, group: u32, id: KeyId) -> KeyItem {
        KeyItem {
            id,
            button,
            group,
            sensitive: ModifierMask::EMPTY,
            required: ModifierMask::EMPTY,
            generated: ModifierMask::EMPTY,
            locks_modifier: false,
        }
    }

    #[test]
    fn test_new_map_is_empty_and_blocks_compose_across_groups() {
        let map = KeyMap::new();
        assert!(map.is_empty());
        assert!(!map.compose_across_groups());
    }

    #[test]
    fn test_entries_preserve_insertion_order() {
        let mut map = KeyMap::new();
        map.add_entry(item(30, 0, KeyId::Char('a')));
        map.add_entry(item(30, 0, KeyId::Char('A')));
        map.add_entry(item(31, 0, KeyId::Char('s')));

        let ids: Vec<KeyId> = map.entries().iter().map(|e| e.id).collect();
        assert_eq!(
            ids,
            vec![KeyId::Char('a'), KeyId::Char('A'), KeyId::Char('s')]
        );
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_entries_for_button_filters_on_button() {
        let mut map = KeyMap::new();
        map.add_entry(item(30, 0, KeyId::Char('a')));
        map.add_entry(item(30, 1, KeyId::Char('é')));
        map.add_entry(item(31, 0, KeyId::Char('s')));

        assert_eq!(map.entries_for_button(30).count(), 2);
        assert_eq!(map.entries_for_button(99).count(), 0);
    }

    #[test]
    fn test_allow_group_switch_during_compose_sets_flag() {
        let mut map = KeyMap::new();
        map.allow_group_switch_during_compose();
        assert!(map.compose_across_groups());
    }

    #[test]
    fn test_keymap_roundtrips_through_serde() {
        let mut map = KeyMap::new();
        let mut entry = item(30, 0, KeyId::Char('A'));
        entry.sensitive = ModifierBit::Shift.mask() | ModifierBit::CapsLock.mask();
        entry.required = ModifierBit::Shift.mask();
        map.add_entry(entry);
        map.allow_group_switch_during_compose();

        let json = serde_json::to_string(&map).expect("serialize must succeed");
        let decoded: KeyMap = serde_json::from_str(&json).expect("deserialize must succeed");
        assert_eq!(map, decoded);
    }
}
