//! # keybridge-core
//!
//! Platform key-state engine for KeyBridge: keyboard-layout compilation,
//! canonical key tables, and live modifier/group state.
//!
//! KeyBridge shares one keyboard between machines: a capture side reads
//! physical key events, an injection side synthesizes them elsewhere. The
//! two machines run different platforms with different keyboard layouts, so
//! they cannot exchange raw, vendor-specific modifier names or keysyms.
//! This crate is the translation core both sides share. It has zero
//! dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! The pipeline, in delivery order:
//!
//! - **[`layout`]** – [`KeymapCompiler`] turns raw layout bytes into a
//!   [`CompiledLayout`], falling back to a built-in default so a usable
//!   layout is always active.
//!
//! - **[`keymap`]** – [`KeyTableBuilder`] walks a compiled layout once and
//!   produces the canonical [`KeyMap`]: for every physical key, which symbol
//!   it produces, which modifiers must/may be held to select it, and which
//!   modifiers the key itself generates.
//!
//! - **[`state`]** – [`ModifierStateTracker`] is then driven continuously by
//!   incoming key events to answer "what modifiers and group are active
//!   right now".
//!
//! - **[`modifier`]** / **[`keysym`]** – the fixed canonical vocabulary both
//!   machines agree on: nine named modifiers and a keysym-independent key
//!   identity.
//!
//! Everything is single-threaded and synchronous; no component here blocks
//! or performs I/O.

pub mod config;
pub mod inhibit;
pub mod inject;
pub mod keymap;
pub mod keysym;
pub mod layout;
pub mod modifier;
pub mod state;

pub use config::EngineConfig;
pub use inhibit::{ScreenInhibitor, SessionInhibits};
pub use inject::KeyInjector;
pub use keymap::builder::KeyTableBuilder;
pub use keymap::{KeyItem, KeyMap};
pub use keysym::{keysym_to_key_id, KeyId};
pub use layout::{CompileError, CompiledLayout, KeymapCompiler, KEYCODE_OFFSET};
pub use modifier::{classify, ModClass, ModifierBit, ModifierMask};
pub use state::{ModifierStateTracker, StateComponent};
