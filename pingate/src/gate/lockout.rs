//! Failed-attempt counter.
//!
//! `attempts_left` starts at the maximum, drops by one per failed
//! verification and is restored to the maximum by a success. It never goes
//! below zero; zero means lockout.

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Store key holding the remaining attempts as a decimal integer.
pub const KEY_ATTEMPTS_LEFT: &str = "attempts_left";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Write the maximum if no counter is stored yet, then return the count.
    pub fn ensure_initialized<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<u32> {
        if !store.contains(KEY_ATTEMPTS_LEFT)? {
            store.put(KEY_ATTEMPTS_LEFT, &self.max_attempts.to_string())?;
            debug!("Initialized attempts_left to {}", self.max_attempts);
            return Ok(self.max_attempts);
        }
        self.attempts_left(store)
    }

    /// Remaining attempts, clamped to `0..=max_attempts`.
    ///
    /// An absent counter reads as the maximum. A value that is not an integer
    /// is reported and also read as the maximum.
    pub fn attempts_left<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<u32> {
        let Some(raw) = store.get(KEY_ATTEMPTS_LEFT)? else {
            return Ok(self.max_attempts);
        };

        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(value.clamp(0, i64::from(self.max_attempts)) as u32),
            Err(_) => {
                warn!("Unreadable attempts_left value {:?}, using maximum", raw);
                Ok(self.max_attempts)
            }
        }
    }

    /// Count one failed verification and return what is left.
    pub fn record_failure<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<u32> {
        let left = self.attempts_left(store)?.saturating_sub(1);
        store.put(KEY_ATTEMPTS_LEFT, &left.to_string())?;
        Ok(left)
    }

    /// Restore the counter to the maximum.
    pub fn record_success<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.put(KEY_ATTEMPTS_LEFT, &self.max_attempts.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_initialization_only_once() {
        let store = MemoryStore::new();
        let policy = LockoutPolicy::new(3);

        assert_eq!(policy.ensure_initialized(&store).unwrap(), 3);
        policy.record_failure(&store).unwrap();
        assert_eq!(policy.ensure_initialized(&store).unwrap(), 2);
    }

    #[test]
    fn test_failures_count_down_to_zero() {
        let store = MemoryStore::new();
        let policy = LockoutPolicy::new(3);

        assert_eq!(policy.record_failure(&store).unwrap(), 2);
        assert_eq!(policy.record_failure(&store).unwrap(), 1);
        assert_eq!(policy.record_failure(&store).unwrap(), 0);
        assert_eq!(policy.record_failure(&store).unwrap(), 0);
        assert_eq!(store.get(KEY_ATTEMPTS_LEFT).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_success_resets() {
        let store = MemoryStore::new();
        let policy = LockoutPolicy::new(3);

        policy.record_failure(&store).unwrap();
        policy.record_failure(&store).unwrap();
        policy.record_success(&store).unwrap();
        assert_eq!(policy.attempts_left(&store).unwrap(), 3);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let store = MemoryStore::new();
        let policy = LockoutPolicy::new(3);

        store.put(KEY_ATTEMPTS_LEFT, "-1").unwrap();
        assert_eq!(policy.attempts_left(&store).unwrap(), 0);

        store.put(KEY_ATTEMPTS_LEFT, "10").unwrap();
        assert_eq!(policy.attempts_left(&store).unwrap(), 3);
    }

    #[test]
    fn test_garbage_reads_as_maximum() {
        let store = MemoryStore::new();
        let policy = LockoutPolicy::new(3);

        store.put(KEY_ATTEMPTS_LEFT, "three").unwrap();
        assert_eq!(policy.attempts_left(&store).unwrap(), 3);
    }
}
