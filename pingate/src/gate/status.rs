//! Gate state and status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vault::CipherSuite;

/// Represents where the gate flow currently is.
///
/// The gate transitions between these states:
/// - `Enroll` → `Unlocked` (after the first PIN is saved)
/// - `AwaitingInput` → `Unlocked` (correct PIN)
/// - `AwaitingInput` → `AwaitingInput` (wrong PIN, attempts remain)
/// - `AwaitingInput` → `LockedOut` (wrong PIN, no attempts left)
/// - `Unlocked` → `AwaitingInput` (explicit lock)
///
/// `LockedOut` is terminal: the store is wiped and the process exits.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GateState {
    /// No PIN enrolled yet
    #[default]
    Enroll,
    /// PIN enrolled, waiting for the user to enter it
    AwaitingInput,
    /// Gate passed, the application may proceed
    Unlocked,
    /// Attempts exhausted, wipe pending or running
    LockedOut,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enroll => write!(f, "Enroll"),
            Self::AwaitingInput => write!(f, "AwaitingInput"),
            Self::Unlocked => write!(f, "Unlocked"),
            Self::LockedOut => write!(f, "LockedOut"),
        }
    }
}

/// Snapshot of the gate for front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    pub state: GateState,
    pub attempts_left: u32,
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherSuite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&GateState::AwaitingInput).unwrap(),
            "\"AwaitingInput\""
        );
        assert_eq!(GateState::default(), GateState::Enroll);
    }

    #[test]
    fn test_status_omits_empty_fields() {
        let status = GateStatus {
            state: GateState::Enroll,
            attempts_left: 3,
            max_attempts: 3,
            cipher: None,
            enrolled_at: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("cipher"));
        assert!(!json.contains("enrolled_at"));
    }
}
