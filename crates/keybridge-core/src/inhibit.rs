//! Screen-inhibit capability.
//!
//! While a remote session is active the embedding application keeps the
//! local screensaver and idle actions from firing. The D-Bus call that does
//! the actual inhibiting is out of scope here; this module defines the
//! capability boundary and the per-session bookkeeping of which services
//! currently hold a lock.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

/// Error type for inhibit bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InhibitError {
    /// The service already holds an inhibit lock.
    #[error("service {0:?} already holds an inhibit lock")]
    AlreadyInhibited(String),

    /// The service holds no inhibit lock to release.
    #[error("service {0:?} holds no inhibit lock")]
    NotInhibited(String),
}

/// Capability interface for screen/idle inhibition.
pub trait ScreenInhibitor {
    /// Takes an inhibit lock on behalf of `service_id`.
    fn inhibit(&mut self, service_id: &str) -> Result<(), InhibitError>;

    /// Releases the inhibit lock held by `service_id`.
    fn uninhibit(&mut self, service_id: &str) -> Result<(), InhibitError>;
}

/// Per-session record of held inhibit locks.
///
/// One record travels with each session; nothing here is process-global, so
/// concurrent sessions cannot clobber each other's locks.
#[derive(Debug, Default)]
pub struct SessionInhibits {
    active: BTreeSet<String>,
}

impl SessionInhibits {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `service_id` currently holds a lock.
    pub fn is_inhibited(&self, service_id: &str) -> bool {
        self.active.contains(service_id)
    }

    /// Number of services currently holding locks.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl ScreenInhibitor for SessionInhibits {
    fn inhibit(&mut self, service_id: &str) -> Result<(), InhibitError> {
        if !self.active.insert(service_id.to_string()) {
            return Err(InhibitError::AlreadyInhibited(service_id.to_string()));
        }
        debug!("inhibit lock taken for {service_id}");
        Ok(())
    }

    fn uninhibit(&mut self, service_id: &str) -> Result<(), InhibitError> {
        if !self.active.remove(service_id) {
            return Err(InhibitError::NotInhibited(service_id.to_string()));
        }
        debug!("inhibit lock released for {service_id}");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
