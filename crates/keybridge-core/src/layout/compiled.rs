//! Compiled, queryable form of a keyboard layout.
//!
//! A [`CompiledLayout`] is the resolved output of the layout compiler: the
//! layout's raw modifier-name table (index order = raw bit order), and every
//! key's group/level tables with the raw modifier-mask combinations that
//! select each level. It is immutable once built; the live tracker and any
//! number of disposable detection trackers share it behind an `Arc`, which is
//! also what makes layout swaps atomic (a superseded layout stays alive until
//! its last holder drops).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::modifier::{classify, lookup, ModClass, ModifierMask};

/// Native keycodes are external button numbers plus this fixed offset.
pub const KEYCODE_OFFSET: u32 = 8;

const EMPTY_SYMS: &[u32] = &[];
const EMPTY_MASKS: &[u32] = &[];

/// How a generated modifier behaves across press/release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModBehavior {
    /// Active while the key is held.
    Set,
    /// Applies to the next non-modifier press, then consumed.
    Latch,
    /// Toggled on press, survives release.
    Lock,
}

/// A key's generated-modifier action, in raw (layout-local) mask space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModAction {
    pub mask: u32,
    pub behavior: ModBehavior,
}

/// One symbol level: the symbols it produces and the raw modifier-mask
/// combinations that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledLevel {
    pub syms: Vec<u32>,
    pub masks: Vec<u32>,
}

/// One layout group of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledGroup {
    pub levels: Vec<CompiledLevel>,
}

/// One physical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledKey {
    pub groups: Vec<CompiledGroup>,
    pub generates: Option<ModAction>,
    /// Locked-group delta applied on press (group-switch keys).
    pub group_shift: Option<i32>,
}

impl CompiledKey {
    /// Wraps an out-of-range group index onto this key's own group count,
    /// matching the platform redirect behavior for keys with fewer groups
    /// than the layout.
    pub fn resolve_group(&self, group: u32) -> Option<usize> {
        if self.groups.is_empty() {
            return None;
        }
        Some(group as usize % self.groups.len())
    }
}

/// A compiled keyboard layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLayout {
    name: String,
    mod_names: Vec<String>,
    num_groups: u32,
    keys: BTreeMap<u32, CompiledKey>,
}

impl CompiledLayout {
    pub(crate) fn new(name: String, mod_names: Vec<String>, keys: BTreeMap<u32, CompiledKey>) -> Self {
        let num_groups = keys
            .values()
            .map(|k| k.groups.len() as u32)
            .max()
            .unwrap_or(0)
            .max(1);
        Self {
            name,
            mod_names,
            num_groups,
            keys,
        }
    }

    /// The layout's name, as declared by its source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of raw modifier slots this layout declares.
    pub fn num_mods(&self) -> u32 {
        self.mod_names.len() as u32
    }

    /// The native name of a raw modifier slot.
    pub fn mod_name(&self, index: u32) -> Option<&str> {
        self.mod_names.get(index as usize).map(String::as_str)
    }

    /// Number of groups (alternate full layouts) in this layout.
    pub fn num_groups(&self) -> u32 {
        self.num_groups
    }

    /// Lowest keycode with an entry, or 0 for an empty layout.
    pub fn min_keycode(&self) -> u32 {
        self.keys.first_key_value().map(|(k, _)| *k).unwrap_or(0)
    }

    /// Highest keycode with an entry, or 0 for an empty layout.
    pub fn max_keycode(&self) -> u32 {
        self.keys.last_key_value().map(|(k, _)| *k).unwrap_or(0)
    }

    /// Number of groups defined for one key; 0 if the key produces nothing.
    pub fn num_groups_for_key(&self, keycode: u32) -> u32 {
        self.keys
            .get(&keycode)
            .map(|k| k.groups.len() as u32)
            .unwrap_or(0)
    }

    /// Number of levels for one key in one group (wrapped onto the key's own
    /// group count).
    pub fn num_levels_for_key(&self, keycode: u32, group: u32) -> u32 {
        self.group_of(keycode, group)
            .map(|g| g.levels.len() as u32)
            .unwrap_or(0)
    }

    /// Symbols produced at one key/group/level, empty when out of range.
    pub fn syms_for_level(&self, keycode: u32, group: u32, level: u32) -> &[u32] {
        self.level_of(keycode, group, level)
            .map(|l| l.syms.as_slice())
            .unwrap_or(EMPTY_SYMS)
    }

    /// Raw modifier-mask combinations that select one key/group/level.
    pub fn masks_for_level(&self, keycode: u32, group: u32, level: u32) -> &[u32] {
        self.level_of(keycode, group, level)
            .map(|l| l.masks.as_slice())
            .unwrap_or(EMPTY_MASKS)
    }

    /// Converts a raw (layout-local) modifier mask into the canonical
    /// vocabulary.
    ///
    /// Every active slot is classified by name; ignored and unknown names
    /// contribute no bits (the normalizer logs them), so an uncovered native
    /// modifier can never corrupt the canonical mask.
    pub fn normalize_mask(&self, raw: u32) -> ModifierMask {
        let mut out = ModifierMask::EMPTY;
        for (index, name) in self.mod_names.iter().enumerate() {
            if raw & (1 << index) == 0 {
                continue;
            }
            if let ModClass::Bit(bit) = classify(name) {
                out.insert(bit);
            }
        }
        out
    }

    /// Modifier names in this layout's table that the normalizer cannot
    /// classify. Consulted by the strict compile policy; does not log.
    pub(crate) fn unknown_modifier_names(&self) -> Vec<&str> {
        self.mod_names
            .iter()
            .map(String::as_str)
            .filter(|name| lookup(name) == ModClass::Unknown)
            .collect()
    }

    pub(crate) fn key(&self, keycode: u32) -> Option<&CompiledKey> {
        self.keys.get(&keycode)
    }

    fn group_of(&self, keycode: u32, group: u32) -> Option<&CompiledGroup> {
        let key = self.keys.get(&keycode)?;
        let resolved = key.resolve_group(group)?;
        key.groups.get(resolved)
    }

    fn level_of(&self, keycode: u32, group: u32, level: u32) -> Option<&CompiledLevel> {
        self.group_of(keycode, group)?.levels.get(level as usize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierBit;

    fn two_group_layout() -> CompiledLayout {
        let mut keys = BTreeMap::new();
        keys.insert(
            10,
            CompiledKey {
                groups: vec![
                    CompiledGroup {
                        levels: vec![
                            CompiledLevel { syms: vec![0x61], masks: vec![0] },
                            CompiledLevel { syms: vec![0x41], masks: vec![0b01, 0b10] },
                        ],
                    },
                    CompiledGroup {
                        levels: vec![CompiledLevel { syms: vec![0xE9], masks: vec![0] }],
                    },
                ],
                generates: None,
                group_shift: None,
            },
        );
        keys.insert(
            20,
            CompiledKey {
                groups: vec![CompiledGroup {
                    levels: vec![CompiledLevel { syms: vec![0x20], masks: vec![0] }],
                }],
                generates: None,
                group_shift: None,
            },
        );
        CompiledLayout::new(
            "test".to_string(),
            vec!["Shift".to_string(), "CapsLock".to_string(), "Frob".to_string()],
            keys,
        )
    }

    #[test]
    fn test_num_groups_is_max_over_keys() {
        let layout = two_group_layout();
        assert_eq!(layout.num_groups(), 2);
    }

    #[test]
    fn test_keycode_range_comes_from_key_table() {
        let layout = two_group_layout();
        assert_eq!(layout.min_keycode(), 10);
        assert_eq!(layout.max_keycode(), 20);
    }

    #[test]
    fn test_queries_for_absent_key_are_empty() {
        let layout = two_group_layout();
        assert_eq!(layout.num_groups_for_key(99), 0);
        assert_eq!(layout.num_levels_for_key(99, 0), 0);
        assert!(layout.syms_for_level(99, 0, 0).is_empty());
        assert!(layout.masks_for_level(99, 0, 0).is_empty());
    }

    #[test]
    fn test_group_index_wraps_onto_per_key_count() {
        let layout = two_group_layout();
        // Key 20 has one group; asking for group 1 wraps back to group 0.
        assert_eq!(layout.num_levels_for_key(20, 1), 1);
        assert_eq!(layout.syms_for_level(20, 1, 0), &[0x20]);
        // Key 10 has two groups and resolves them directly.
        assert_eq!(layout.syms_for_level(10, 1, 0), &[0xE9]);
    }

    #[test]
    fn test_normalize_mask_maps_named_slots_to_canonical_bits() {
        let layout = two_group_layout();
        let mask = layout.normalize_mask(0b011);
        assert!(mask.contains(ModifierBit::Shift));
        assert!(mask.contains(ModifierBit::CapsLock));
    }

    #[test]
    fn test_normalize_mask_excludes_unknown_slots() {
        let layout = two_group_layout();
        // Slot 2 ("Frob") is active but unclassifiable; it must not leak in.
        let mask = layout.normalize_mask(0b100);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_normalize_mask_ignores_inactive_slots() {
        let layout = two_group_layout();
        assert_eq!(layout.normalize_mask(0), ModifierMask::EMPTY);
    }

    #[test]
    fn test_unknown_modifier_names_reports_unclassifiable_slots() {
        let layout = two_group_layout();
        assert_eq!(layout.unknown_modifier_names(), vec!["Frob"]);
    }
}
