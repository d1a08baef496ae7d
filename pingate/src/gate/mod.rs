//! Local credential gate.
//!
//! The gate decides between enrollment and verification, counts failed
//! attempts and, once they are exhausted, schedules a wipe of all
//! application data followed by process termination.

pub mod lockout;
pub mod manager;
pub mod status;
pub mod wipe;

pub use lockout::{LockoutPolicy, KEY_ATTEMPTS_LEFT};
pub use manager::{Attempt, CredentialGate};
pub use status::{GateState, GateStatus};
pub use wipe::{ExitProcess, Terminator, WipeReport, WipeScheduler, WipeTicket};
