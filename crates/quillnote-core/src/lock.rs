//! Pin-lock state machine for notes.
//!
//! A note is either `Unlocked` or `Locked` with a stored PIN hash. All
//! transitions are pure: PIN hashing and verification are injected so the
//! machine can be tested without touching Argon2, and so wrong-PIN paths
//! provably never mutate state.
//!
//! ```text
//! UNLOCKED --set_pin--> LOCKED            (stores hash)
//! LOCKED --verify_pin(correct)--> LOCKED  (read grant, no mutation)
//! LOCKED --remove_pin(correct)--> UNLOCKED
//! LOCKED --any(wrong)--> LOCKED           (Unauthorized)
//! ```

use crate::error::{Error, Result};

/// Lock status of a note, carrying the PIN hash when locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { pin_hash: String },
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }

    /// Lock with an already-hashed PIN.
    ///
    /// Fails with `InvalidInput` if the note is already locked; an existing
    /// PIN must be removed before a new one is set.
    pub fn set_pin(&self, pin_hash: String) -> Result<LockState> {
        match self {
            LockState::Unlocked => Ok(LockState::Locked { pin_hash }),
            LockState::Locked { .. } => {
                Err(Error::InvalidInput("note is already locked".to_string()))
            }
        }
    }

    /// Read-only PIN gate: grants access without changing state.
    ///
    /// `verify` receives the candidate PIN and the stored hash.
    pub fn verify_pin<F>(&self, pin: &str, verify: F) -> Result<()>
    where
        F: Fn(&str, &str) -> bool,
    {
        match self {
            LockState::Unlocked => Err(Error::InvalidInput("note is not locked".to_string())),
            LockState::Locked { pin_hash } => {
                if verify(pin, pin_hash) {
                    Ok(())
                } else {
                    Err(Error::Unauthorized("incorrect PIN".to_string()))
                }
            }
        }
    }

    /// Permanently remove the lock given the correct PIN.
    pub fn remove_pin<F>(&self, pin: &str, verify: F) -> Result<LockState>
    where
        F: Fn(&str, &str) -> bool,
    {
        self.verify_pin(pin, verify)?;
        Ok(LockState::Unlocked)
    }

    /// Consume the state into the persistable hash column value.
    pub fn into_pin_hash(self) -> Option<String> {
        match self {
            LockState::Unlocked => None,
            LockState::Locked { pin_hash } => Some(pin_hash),
        }
    }
}
