//! Keyboard layout compilation.
//!
//! A layout travels as raw bytes (delivered by the remote input exchange,
//! which is not this crate's concern), gets parsed and validated into a
//! [`CompiledLayout`], and is owned from then on by the [`KeymapCompiler`]
//! together with the live tracker bound to it. The built-in default layout
//! stands in before the first delivery and after a failed one.

pub mod compiled;
pub mod compiler;

mod default;
pub(crate) mod source;

pub use compiled::{CompiledLayout, ModBehavior, KEYCODE_OFFSET};
pub use compiler::{CompileError, KeymapCompiler};
