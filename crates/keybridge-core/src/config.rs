//! Engine configuration.
//!
//! Settings persistence and scoping live in the embedding application; this
//! crate only defines the engine's own knobs and parses them from a TOML
//! fragment the application hands over.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML content could not be parsed.
    #[error("failed to parse engine config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunable behavior of the layout compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When set, a layout whose modifier table contains a name the canonical
    /// vocabulary cannot classify fails compilation (and the default layout
    /// stands) instead of having the bit silently excluded from masks.
    #[serde(default)]
    pub strict_unknown_modifiers: bool,

    /// Upper bound on the declared length of a layout source, in bytes.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
}

fn default_max_source_bytes() -> usize {
    1024 * 1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_unknown_modifiers: false,
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

impl EngineConfig {
    /// Parses a config from a TOML fragment; absent fields take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
