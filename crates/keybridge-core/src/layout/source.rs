//! Layout source parsing and validation.
//!
//! A layout source is a UTF-8 JSON document delivered by the remote input
//! exchange. It declares the layout's modifier-name table (index order = raw
//! bit order) and, per key: the keycode, groups, levels (symbols plus the
//! modifier-name combinations that select each level), an optional
//! generated-modifier action, and an optional group-switch delta.
//!
//! ```json
//! {
//!   "name": "example",
//!   "modifiers": ["Shift", "CapsLock"],
//!   "keys": [
//!     { "keycode": 38,
//!       "groups": [ { "levels": [
//!         { "syms": [97], "masks": [[]] },
//!         { "syms": [65], "masks": [["Shift"], ["CapsLock"]] }
//!       ] } ] },
//!     { "keycode": 50,
//!       "groups": [ { "levels": [ { "syms": [65505], "masks": [[]] } ] } ],
//!       "generates": { "modifiers": ["Shift"] } }
//!   ]
//! }
//! ```
//!
//! Parsing is strict where it matters for the compiled tables: duplicate
//! keycodes, keycodes below the external-numbering offset, more than 32
//! declared modifiers (masks are 32-bit), and mask references to undeclared
//! modifier names are all rejected. Modifier names the canonical vocabulary
//! does not cover are NOT rejected here; that is the normalizer's concern
//! (and, optionally, the compiler's strict policy).

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use super::compiled::{
    CompiledGroup, CompiledKey, CompiledLayout, CompiledLevel, ModAction, ModBehavior,
    KEYCODE_OFFSET,
};

/// Masks are 32-bit, so a layout can declare at most this many modifiers.
const MAX_MODIFIERS: usize = 32;

/// Errors produced while parsing and validating a layout source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The document is not valid JSON for the layout schema.
    #[error("invalid layout document: {0}")]
    Json(#[from] serde_json::Error),

    /// More modifier slots than a raw mask can carry.
    #[error("layout declares {count} modifiers, at most {MAX_MODIFIERS} are supported")]
    TooManyModifiers { count: usize },

    /// Two key entries share one keycode.
    #[error("duplicate keycode {0}")]
    DuplicateKeycode(u32),

    /// The keycode cannot be expressed as an external button number.
    #[error("keycode {0} is below the external-numbering offset {KEYCODE_OFFSET}")]
    ReservedKeycode(u32),

    /// A mask or action references a modifier the layout does not declare.
    #[error("keycode {keycode} references undeclared modifier {name:?}")]
    UndeclaredModifier { keycode: u32, name: String },
}

#[derive(Debug, Deserialize)]
struct LayoutSource {
    #[serde(default)]
    name: Option<String>,
    modifiers: Vec<String>,
    #[serde(default)]
    keys: Vec<KeySource>,
}

#[derive(Debug, Deserialize)]
struct KeySource {
    keycode: u32,
    #[serde(default)]
    groups: Vec<GroupSource>,
    #[serde(default)]
    generates: Option<GeneratesSource>,
    #[serde(default)]
    group_shift: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GroupSource {
    #[serde(default)]
    levels: Vec<LevelSource>,
}

#[derive(Debug, Deserialize)]
struct LevelSource {
    #[serde(default)]
    syms: Vec<u32>,
    /// Selecting combinations, each a set of declared modifier names.
    #[serde(default)]
    masks: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GeneratesSource {
    modifiers: Vec<String>,
    #[serde(default = "default_behavior")]
    behavior: ModBehavior,
}

fn default_behavior() -> ModBehavior {
    ModBehavior::Set
}

/// Parses and validates a layout source document.
pub(crate) fn compile_source(text: &str) -> Result<CompiledLayout, SourceError> {
    let source: LayoutSource = serde_json::from_str(text)?;

    if source.modifiers.len() > MAX_MODIFIERS {
        return Err(SourceError::TooManyModifiers {
            count: source.modifiers.len(),
        });
    }

    let mut keys = BTreeMap::new();
    for key in source.keys {
        if key.keycode < KEYCODE_OFFSET {
            return Err(SourceError::ReservedKeycode(key.keycode));
        }

        let groups = key
            .groups
            .into_iter()
            .map(|group| {
                let levels = group
                    .levels
                    .into_iter()
                    .map(|level| {
                        let masks = level
                            .masks
                            .iter()
                            .map(|combo| names_to_mask(&source.modifiers, combo, key.keycode))
                            .collect::<Result<Vec<u32>, SourceError>>()?;
                        Ok(CompiledLevel { syms: level.syms, masks })
                    })
                    .collect::<Result<Vec<CompiledLevel>, SourceError>>()?;
                Ok(CompiledGroup { levels })
            })
            .collect::<Result<Vec<CompiledGroup>, SourceError>>()?;

        let generates = match key.generates {
            Some(gen) => Some(ModAction {
                mask: names_to_mask(&source.modifiers, &gen.modifiers, key.keycode)?,
                behavior: gen.behavior,
            }),
            None => None,
        };

        let compiled = CompiledKey {
            groups,
            generates,
            group_shift: key.group_shift,
        };
        if keys.insert(key.keycode, compiled).is_some() {
            return Err(SourceError::DuplicateKeycode(key.keycode));
        }
    }

    Ok(CompiledLayout::new(
        source.name.unwrap_or_else(|| "unnamed".to_string()),
        source.modifiers,
        keys,
    ))
}

/// Resolves a set of declared modifier names into a raw mask.
fn names_to_mask(declared: &[String], combo: &[String], keycode: u32) -> Result<u32, SourceError> {
    let mut mask = 0u32;
    for name in combo {
        let index = declared.iter().position(|m| m == name).ok_or_else(|| {
            SourceError::UndeclaredModifier {
                keycode,
                name: name.clone(),
            }
        })?;
        mask |= 1 << index;
    }
    Ok(mask)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
