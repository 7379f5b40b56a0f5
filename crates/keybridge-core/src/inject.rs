//! Key-injection seam.
//!
//! The platform backend that turns canonical entries back into native key
//! events lives outside this crate; [`KeyInjector`] is the boundary it
//! implements. Tests drive the boundary with a mock.

use thiserror::Error;
use tracing::debug;

use crate::keymap::KeyItem;
use crate::keysym::KeyId;

#[cfg(test)]
use mockall::automock;

/// Error type for key injection.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The platform backend is not available (no session, no permission).
    #[error("injection backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend has no native event for this button.
    #[error("button {0} cannot be synthesized on this platform")]
    UnmappableButton(u32),
}

/// Trait abstracting native key-event synthesis.
///
/// The production implementation wraps the platform input stack; tests use
/// the generated mock.
#[cfg_attr(test, automock)]
pub trait KeyInjector {
    /// Synthesizes one native key transition for a canonical entry.
    fn inject_key(&mut self, id: KeyId, button: u32, pressed: bool) -> Result<(), InjectError>;
}

/// Drives one key-table entry through an injector as a press/release pair.
pub fn tap(injector: &mut dyn KeyInjector, item: &KeyItem) -> Result<(), InjectError> {
    debug!("fake key: button {} ({:?}) down", item.button, item.id);
    injector.inject_key(item.id, item.button, true)?;
    debug!("fake key: button {} ({:?}) up", item.button, item.id);
    injector.inject_key(item.id, item.button, false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierMask;
    use mockall::predicate::eq;

    fn entry(button: u32, id: KeyId) -> KeyItem {
        KeyItem {
            id,
            button,
            group: 0,
            sensitive: ModifierMask::EMPTY,
            required: ModifierMask::EMPTY,
            generated: ModifierMask::EMPTY,
            locks_modifier: false,
        }
    }

    #[test]
    fn test_tap_emits_press_then_release() {
        let mut injector = MockKeyInjector::new();
        let mut seq = mockall::Sequence::new();
        injector
            .expect_inject_key()
            .with(eq(KeyId::Char('a')), eq(30u32), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        injector
            .expect_inject_key()
            .with(eq(KeyId::Char('a')), eq(30u32), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        tap(&mut injector, &entry(30, KeyId::Char('a'))).expect("tap must succeed");
    }

    #[test]
    fn test_tap_stops_after_failed_press() {
        let mut injector = MockKeyInjector::new();
        injector
            .expect_inject_key()
            .times(1)
            .returning(|_, button, _| Err(InjectError::UnmappableButton(button)));

        let err = tap(&mut injector, &entry(200, KeyId::Unknown)).expect_err("must fail");
        assert!(matches!(err, InjectError::UnmappableButton(200)));
    }
}
