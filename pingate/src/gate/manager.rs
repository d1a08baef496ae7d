//! CredentialGate - the PIN gate state machine.
//!
//! This module provides the `CredentialGate` struct that handles:
//! - Choosing between enrollment and verification at startup
//! - Enrolling the first PIN
//! - Verifying PIN attempts and counting failures
//! - Entering lockout and scheduling the data wipe
//! - Explicit, user-initiated reset
//!
//! All state lives in the injected `KeyValueStore`; the gate itself only
//! keeps the current `GateState`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::lockout::LockoutPolicy;
use super::status::{GateState, GateStatus};
use super::wipe::{WipeScheduler, WipeTicket};
use crate::error::{PinGateError, Result};
use crate::storage::{GateConfig, KeyValueStore};
use crate::vault::SecretVault;

/// Result of submitting a PIN.
#[derive(Debug)]
pub enum Attempt {
    /// Correct PIN, the application may proceed.
    Granted,
    /// Wrong PIN. The input should be cleared and the count shown.
    Rejected { attempts_left: u32 },
    /// Wrong PIN and no attempts left. The wipe is already scheduled.
    LockedOut(WipeTicket),
}

pub struct CredentialGate<S: KeyValueStore + 'static> {
    store: Arc<S>,
    vault: SecretVault<S>,
    policy: LockoutPolicy,
    wiper: WipeScheduler,
    config: GateConfig,
    state: GateState,
}

impl<S: KeyValueStore + 'static> CredentialGate<S> {
    /// Open the gate over `store` and pick the starting state.
    ///
    /// An enrolled store whose counter is already at zero starts in
    /// `LockedOut`: a wipe interrupted by process death resumes through
    /// `pending_wipe()`.
    pub fn open(store: Arc<S>, config: GateConfig, wiper: WipeScheduler) -> Result<Self> {
        config.validate()?;
        if !config.cipher.is_authenticated() {
            debug!("New enrollments use {} without an authentication tag", config.cipher);
        }

        let vault = SecretVault::new(store.clone(), config.cipher);
        let policy = LockoutPolicy::new(config.max_attempts);
        let attempts_left = policy.ensure_initialized(&*store)?;

        let state = if !vault.is_enrolled()? {
            GateState::Enroll
        } else if attempts_left == 0 {
            warn!("Gate opened with no attempts left");
            GateState::LockedOut
        } else {
            GateState::AwaitingInput
        };

        info!("Gate opened in state {} ({} attempts left)", state, attempts_left);
        Ok(Self {
            store,
            vault,
            policy,
            wiper,
            config,
            state,
        })
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Remaining attempts. Always zero once lockout has been entered, even
    /// after the wipe removed the stored counter.
    pub fn attempts_left(&self) -> Result<u32> {
        if self.state == GateState::LockedOut {
            return Ok(0);
        }
        self.policy.attempts_left(&*self.store)
    }

    pub fn status(&self) -> Result<GateStatus> {
        let meta = match self.vault.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Could not read vault metadata: {}", e);
                None
            }
        };

        Ok(GateStatus {
            state: self.state,
            attempts_left: self.attempts_left()?,
            max_attempts: self.policy.max_attempts(),
            cipher: meta.as_ref().map(|m| m.cipher),
            enrolled_at: meta.and_then(|m| m.enrolled_at),
        })
    }

    /// Enroll the first PIN.
    ///
    /// # Errors
    /// `EmptySecret`/`SecretTooShort` for invalid input, `AlreadyEnrolled`
    /// outside the `Enroll` state, `KeyUnavailable` and `Encryption` from the
    /// vault. On error nothing is saved and the gate stays in `Enroll`.
    pub fn enroll(&mut self, secret: &str) -> Result<()> {
        match self.state {
            GateState::Enroll => {}
            GateState::LockedOut => return Err(PinGateError::LockedOut),
            GateState::AwaitingInput | GateState::Unlocked => {
                return Err(PinGateError::AlreadyEnrolled)
            }
        }

        if secret.is_empty() {
            return Err(PinGateError::EmptySecret);
        }
        if secret.chars().count() < self.config.min_secret_len {
            return Err(PinGateError::SecretTooShort(self.config.min_secret_len));
        }

        self.vault.enroll(secret)?;
        self.state = GateState::Unlocked;

        info!("PIN saved, gate unlocked");
        Ok(())
    }

    /// Submit a PIN attempt.
    ///
    /// An empty candidate is rejected with `EmptySecret` without using an
    /// attempt. Any failure to open the stored PIN counts as a wrong PIN.
    pub fn submit(&mut self, candidate: &str) -> Result<Attempt> {
        match self.state {
            GateState::AwaitingInput | GateState::Unlocked => {}
            GateState::Enroll => return Err(PinGateError::NotEnrolled),
            GateState::LockedOut => return Err(PinGateError::LockedOut),
        }

        if candidate.is_empty() {
            return Err(PinGateError::EmptySecret);
        }

        if self.vault.verify(candidate)? {
            self.policy.record_success(&*self.store)?;
            self.state = GateState::Unlocked;
            info!("PIN verified, gate unlocked");
            return Ok(Attempt::Granted);
        }

        let attempts_left = self.policy.record_failure(&*self.store)?;
        if attempts_left > 0 {
            self.state = GateState::AwaitingInput;
            warn!("Wrong PIN, {} attempts left", attempts_left);
            return Ok(Attempt::Rejected { attempts_left });
        }

        error!("Wrong PIN, attempts exhausted - entering lockout");
        self.state = GateState::LockedOut;
        let ticket = self.pending_wipe().ok_or(PinGateError::LockedOut)?;
        Ok(Attempt::LockedOut(ticket))
    }

    /// Schedule the wipe if the gate is locked out and it has not been
    /// scheduled yet.
    pub fn pending_wipe(&mut self) -> Option<WipeTicket> {
        if self.state != GateState::LockedOut {
            return None;
        }
        self.wiper.schedule(self.store.clone())
    }

    /// Require the PIN again, e.g. when the application goes to background.
    pub fn lock(&mut self) {
        if self.state == GateState::Unlocked {
            debug!("Locking gate");
            self.state = GateState::AwaitingInput;
        }
    }

    /// Wipe the vault, the key and the counter at the user's request and
    /// return to `Enroll`. The process keeps running.
    ///
    /// # Errors
    /// `LockedOut` once lockout has been entered; that wipe is already
    /// under way.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == GateState::LockedOut {
            return Err(PinGateError::LockedOut);
        }

        self.store.clear()?;
        self.policy.ensure_initialized(&*self.store)?;
        self.state = GateState::Enroll;

        info!("Gate reset, all application data cleared");
        Ok(())
    }
}
