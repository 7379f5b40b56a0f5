//! Canonical key-table construction.
//!
//! Walks a compiled layout's full keycode/group/level space and emits one
//! [`KeyItem`] per reachable symbol (two for Shift/CapsLock-interchangeable
//! ones). Deterministic and pure with respect to the layout, aside from log
//! output: entries are emitted per keycode, per group, per level, so two
//! builds of the same layout produce identical maps.
//!
//! The only way to find out whether a key generates a modifier is to press
//! it and look at what changed. The builder does that on a throwaway tracker
//! bound to the same layout, one synthetic press and release per key, so the
//! live tracker never sees the simulation.

use std::sync::Arc;

use tracing::warn;

use crate::keysym::keysym_to_key_id;
use crate::layout::compiled::{CompiledLayout, KEYCODE_OFFSET};
use crate::modifier::{ModifierBit, ModifierMask};
use crate::state::{ModifierStateTracker, StateComponent};

use super::{KeyItem, KeyMap};

/// Builds the canonical [`KeyMap`] for one compiled layout.
pub struct KeyTableBuilder;

impl KeyTableBuilder {
    /// Walks `layout` and produces its canonical key table.
    pub fn build(layout: &Arc<CompiledLayout>) -> KeyMap {
        let mut map = KeyMap::new();

        for keycode in layout.min_keycode()..=layout.max_keycode() {
            // Keys with no groups generate no symbols.
            if layout.num_groups_for_key(keycode) == 0 {
                continue;
            }

            for group in 0..layout.num_groups() {
                for level in 0..layout.num_levels_for_key(keycode, group) {
                    let syms = layout.syms_for_level(keycode, group, level);
                    if syms.is_empty() {
                        continue;
                    }
                    if syms.len() > 1 {
                        warn!("multiple keysyms per level are not supported, keycode {keycode}");
                    }

                    // Every mask combination that selects this level
                    // influences the symbol; the bits those combinations set
                    // are what must be held to reach it.
                    let raw_selecting = layout
                        .masks_for_level(keycode, group, level)
                        .iter()
                        .fold(0u32, |acc, mask| acc | mask);
                    let sensitive = layout.normalize_mask(raw_selecting);
                    let required = sensitive;

                    let (generated, locks_modifier) = detect_generated(layout, keycode);

                    let item = KeyItem {
                        id: keysym_to_key_id(syms[0]),
                        button: keycode - KEYCODE_OFFSET,
                        group,
                        sensitive,
                        required,
                        generated,
                        locks_modifier,
                    };

                    // Where Shift and CapsLock are interchangeable for case
                    // selection, emit both spellings of the requirement.
                    if sensitive.contains(ModifierBit::Shift)
                        && sensitive.contains(ModifierBit::CapsLock)
                    {
                        map.add_entry(KeyItem {
                            required: required
                                .without(ModifierBit::Shift)
                                .with(ModifierBit::CapsLock),
                            ..item
                        });
                        map.add_entry(KeyItem {
                            required: required
                                .with(ModifierBit::Shift)
                                .without(ModifierBit::CapsLock),
                            ..item
                        });
                    } else {
                        map.add_entry(item);
                    }
                }
            }
        }

        // Dead-key sequences must not be interrupted by a group switch.
        map.allow_group_switch_during_compose();
        map
    }
}

/// Simulates one press of `keycode` on a throwaway tracker and reports what
/// it generated: the canonical modifiers active afterwards, and whether any
/// raw slot ended up locked.
fn detect_generated(layout: &Arc<CompiledLayout>, keycode: u32) -> (ModifierMask, bool) {
    let mut probe = ModifierStateTracker::new(Arc::clone(layout));
    let changed = probe.update_keycode(keycode, true);

    let mut raw = 0u32;
    let mut locks = false;
    if !changed.is_empty() {
        for index in 0..layout.num_mods() {
            if probe.mod_index_is_active(index, StateComponent::Locked) {
                locks = true;
            }
            if probe.mod_index_is_active(index, StateComponent::Effective) {
                raw |= 1 << index;
            }
        }
    }
    probe.update_keycode(keycode, false);

    (layout.normalize_mask(raw), locks)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
