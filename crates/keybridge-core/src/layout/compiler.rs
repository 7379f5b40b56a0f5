//! Layout compilation and the active layout/tracker pair.
//!
//! The compiler owns the lifecycle of the active [`CompiledLayout`] and its
//! live [`ModifierStateTracker`]. At construction, and again whenever a
//! delivered source turns out to be malformed, it activates the built-in
//! fallback layout — upstream consumers must always find a usable layout, so
//! the fallback is activated before the error is reported.
//!
//! A swap is atomic from any reader's perspective: the replacement layout and
//! its fresh tracker are fully constructed before the superseded pair is
//! dropped, so the active handles are never dangling or empty mid-swap.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::state::ModifierStateTracker;

use super::compiled::CompiledLayout;
use super::source::compile_source;

/// Errors that can occur while compiling a layout source.
///
/// Neither is fatal: after `TruncatedSource` the previously active layout
/// remains in effect, and after `MalformedSource` the built-in default layout
/// has already been activated.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Fewer bytes were actually available than the sender declared.
    #[error("truncated layout source: declared {declared} bytes, got {available}")]
    TruncatedSource { declared: usize, available: usize },

    /// The bytes were present but the source could not be compiled.
    #[error("malformed layout source: {0}")]
    MalformedSource(String),
}

/// Owner of the active compiled layout and its live tracker.
pub struct KeymapCompiler {
    layout: Arc<CompiledLayout>,
    tracker: ModifierStateTracker,
    config: EngineConfig,
}

impl KeymapCompiler {
    /// Creates a compiler with the built-in default layout active.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a compiler with explicit engine configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let layout = Arc::new(CompiledLayout::default_us());
        let tracker = ModifierStateTracker::new(Arc::clone(&layout));
        Self {
            layout,
            tracker,
            config,
        }
    }

    /// Compiles a delivered layout source and activates it.
    ///
    /// The sender declares how many bytes the source occupies; exactly that
    /// prefix of `raw` is compiled. Trailing NUL terminators are stripped
    /// before parsing — senders differ on whether they append one, and the
    /// parser must see neither more nor less than the document itself.
    ///
    /// # Errors
    ///
    /// - [`CompileError::TruncatedSource`] if `raw` holds fewer than
    ///   `declared_len` bytes; the active layout is unchanged.
    /// - [`CompileError::MalformedSource`] if the source cannot be compiled
    ///   (or violates the strict-modifier policy); the built-in default
    ///   layout has been activated by the time this returns.
    pub fn compile(&mut self, raw: &[u8], declared_len: usize) -> Result<(), CompileError> {
        if raw.len() < declared_len {
            return Err(CompileError::TruncatedSource {
                declared: declared_len,
                available: raw.len(),
            });
        }

        match self.try_compile(&raw[..declared_len]) {
            Ok(layout) => {
                debug!("activating layout {:?}", layout.name());
                self.activate(Arc::new(layout));
                Ok(())
            }
            Err(err) => {
                info!("failed to compile layout source, falling back to default: {err}");
                self.activate(Arc::new(CompiledLayout::default_us()));
                Err(err)
            }
        }
    }

    /// The active compiled layout.
    pub fn layout(&self) -> &Arc<CompiledLayout> {
        &self.layout
    }

    /// The live tracker bound to the active layout.
    pub fn tracker(&self) -> &ModifierStateTracker {
        &self.tracker
    }

    /// Mutable access to the live tracker, for feeding key transitions.
    pub fn tracker_mut(&mut self) -> &mut ModifierStateTracker {
        &mut self.tracker
    }

    fn try_compile(&self, bytes: &[u8]) -> Result<CompiledLayout, CompileError> {
        if bytes.len() > self.config.max_source_bytes {
            return Err(CompileError::MalformedSource(format!(
                "source of {} bytes exceeds the {}-byte limit",
                bytes.len(),
                self.config.max_source_bytes
            )));
        }

        let mut end = bytes.len();
        while end > 0 && bytes[end - 1] == 0 {
            end -= 1;
        }
        let text = std::str::from_utf8(&bytes[..end])
            .map_err(|e| CompileError::MalformedSource(e.to_string()))?;

        let layout =
            compile_source(text).map_err(|e| CompileError::MalformedSource(e.to_string()))?;

        if self.config.strict_unknown_modifiers {
            let unknown = layout.unknown_modifier_names();
            if !unknown.is_empty() {
                return Err(CompileError::MalformedSource(format!(
                    "layout declares unclassifiable modifiers {unknown:?}"
                )));
            }
        }

        Ok(layout)
    }

    /// Swaps in a new layout/tracker pair. The new pair is complete before
    /// the old one is dropped.
    fn activate(&mut self, layout: Arc<CompiledLayout>) {
        self.tracker = ModifierStateTracker::new(Arc::clone(&layout));
        self.layout = layout;
    }
}

impl Default for KeymapCompiler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_SOURCE: &str = r#"{
        "name": "delivered",
        "modifiers": ["Shift"],
        "keys": [
            { "keycode": 38,
              "groups": [ { "levels": [
                  { "syms": [97], "masks": [[]] },
                  { "syms": [65], "masks": [["Shift"]] }
              ] } ] }
        ]
    }"#;

    #[test]
    fn test_new_compiler_starts_with_default_layout() {
        let compiler = KeymapCompiler::new();
        assert_eq!(compiler.layout().name(), "us");
        assert!(compiler.layout().max_keycode() > 0);
    }

    #[test]
    fn test_successful_compile_activates_delivered_layout() {
        let mut compiler = KeymapCompiler::new();

        compiler
            .compile(GOOD_SOURCE.as_bytes(), GOOD_SOURCE.len())
            .expect("compile must succeed");

        assert_eq!(compiler.layout().name(), "delivered");
        // The live tracker was rebound to the new layout.
        assert!(Arc::ptr_eq(compiler.tracker().layout(), compiler.layout()));
    }

    #[test]
    fn test_truncated_source_leaves_active_layout_unchanged() {
        let mut compiler = KeymapCompiler::new();
        compiler
            .compile(GOOD_SOURCE.as_bytes(), GOOD_SOURCE.len())
            .expect("compile must succeed");
        let before = Arc::clone(compiler.layout());

        // Declared 100 bytes, only 80 readable.
        let err = compiler.compile(&[0x7B; 80], 100).expect_err("must fail");

        assert!(matches!(
            err,
            CompileError::TruncatedSource { declared: 100, available: 80 }
        ));
        assert!(Arc::ptr_eq(&before, compiler.layout()));
    }

    #[test]
    fn test_malformed_source_falls_back_to_default_layout() {
        let mut compiler = KeymapCompiler::new();
        compiler
            .compile(GOOD_SOURCE.as_bytes(), GOOD_SOURCE.len())
            .expect("compile must succeed");

        let garbage = b"this is not a layout";
        let err = compiler.compile(garbage, garbage.len()).expect_err("must fail");

        assert!(matches!(err, CompileError::MalformedSource(_)));
        assert_eq!(compiler.layout().name(), "us");
        assert!(Arc::ptr_eq(compiler.tracker().layout(), compiler.layout()));
    }

    #[test]
    fn test_trailing_nul_terminators_are_tolerated() {
        let mut with_nul = GOOD_SOURCE.as_bytes().to_vec();
        with_nul.push(0);

        let mut compiler = KeymapCompiler::new();
        compiler
            .compile(&with_nul, with_nul.len())
            .expect("terminated source must compile");
        let terminated = Arc::clone(compiler.layout());

        compiler
            .compile(GOOD_SOURCE.as_bytes(), GOOD_SOURCE.len())
            .expect("unterminated source must compile");

        assert_eq!(*terminated, **compiler.layout());
    }

    #[test]
    fn test_compile_uses_only_the_declared_prefix() {
        let mut padded = GOOD_SOURCE.as_bytes().to_vec();
        padded.extend_from_slice(b"trailing garbage beyond the declared length");

        let mut compiler = KeymapCompiler::new();
        compiler
            .compile(&padded, GOOD_SOURCE.len())
            .expect("declared prefix must compile");
        assert_eq!(compiler.layout().name(), "delivered");
    }

    #[test]
    fn test_strict_policy_rejects_unclassifiable_modifier_names() {
        let source = r#"{ "modifiers": ["Shift", "Frob"], "keys": [] }"#;

        let mut permissive = KeymapCompiler::new();
        permissive
            .compile(source.as_bytes(), source.len())
            .expect("permissive compile must succeed");

        let mut strict = KeymapCompiler::with_config(EngineConfig {
            strict_unknown_modifiers: true,
            ..EngineConfig::default()
        });
        let err = strict.compile(source.as_bytes(), source.len()).expect_err("must fail");

        assert!(matches!(err, CompileError::MalformedSource(_)));
        assert_eq!(strict.layout().name(), "us");
    }

    #[test]
    fn test_oversized_source_is_rejected_before_parsing() {
        let mut compiler = KeymapCompiler::with_config(EngineConfig {
            max_source_bytes: 16,
            ..EngineConfig::default()
        });

        let err = compiler
            .compile(GOOD_SOURCE.as_bytes(), GOOD_SOURCE.len())
            .expect_err("must fail");
        assert!(matches!(err, CompileError::MalformedSource(_)));
        assert_eq!(compiler.layout().name(), "us");
    }
}
