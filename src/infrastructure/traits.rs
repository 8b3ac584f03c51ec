//! Boundary traits for collaborators outside the session core
//!
//! Cross-session mutual exclusion belongs to whoever manages sessions.
//! Sessions only call through [`EditLock`], so a manager can plug in its own
//! implementation and tests can use the in-process one.

use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("configuration is being edited by {holder}")]
    Held { holder: String },

    #[error("edit lock is poisoned")]
    Poisoned,
}

/// Acquire/release hook guarding write rights over the canonical config.
pub trait EditLock: Send + Sync {
    /// Takes the lock for `user`, failing if someone already holds it.
    fn acquire(&self, user: &str) -> Result<(), LockError>;

    /// Gives the lock back. Releasing a lock held by someone else is a no-op.
    fn release(&self, user: &str);

    /// Current holder, if the implementation knows it.
    fn holder(&self) -> Option<String> {
        None
    }
}

// ============================================================
// IMPLEMENTATIONS
// ============================================================

/// Grants every request. Used when exclusion is handled elsewhere.
#[derive(Debug, Default)]
pub struct NoopEditLock;

impl EditLock for NoopEditLock {
    fn acquire(&self, _user: &str) -> Result<(), LockError> {
        Ok(())
    }

    fn release(&self, _user: &str) {}
}

/// Single-holder lock shared by the sessions of one process.
#[derive(Debug, Default)]
pub struct InProcessEditLock {
    holder: Mutex<Option<String>>,
}

impl EditLock for InProcessEditLock {
    fn acquire(&self, user: &str) -> Result<(), LockError> {
        let mut holder = self.holder.lock().map_err(|_| LockError::Poisoned)?;
        if let Some(current) = holder.as_ref() {
            debug!(user, holder = %current, "edit lock busy");
            return Err(LockError::Held {
                holder: current.clone(),
            });
        }
        *holder = Some(user.to_string());
        debug!(user, "edit lock acquired");
        Ok(())
    }

    fn release(&self, user: &str) {
        let Ok(mut holder) = self.holder.lock() else {
            warn!(user, "edit lock poisoned on release");
            return;
        };
        if holder.as_deref() == Some(user) {
            *holder = None;
            debug!(user, "edit lock released");
        }
    }

    fn holder(&self) -> Option<String> {
        self.holder.lock().ok().and_then(|h| h.clone())
    }
}
