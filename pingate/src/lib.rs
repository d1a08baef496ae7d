//! pingate - local PIN gate with an encrypted credential cache.
//!
//! The gate keeps a PIN encrypted under a per-installation AES-256 key,
//! verifies attempts against it and wipes all application data once the
//! allowed attempts are used up.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pingate::{Attempt, CredentialGate, ExitProcess, FileStore, GateConfig, WipeScheduler};
//!
//! # async fn demo() -> pingate::Result<()> {
//! let config = GateConfig::default();
//! let store = Arc::new(FileStore::open(std::path::Path::new("data"))?);
//! let wiper = WipeScheduler::from_current(config.wipe_delay(), Arc::new(ExitProcess::default()))?;
//! let mut gate = CredentialGate::open(store, config, wiper)?;
//!
//! match gate.submit("1234")? {
//!     Attempt::Granted => println!("welcome"),
//!     Attempt::Rejected { attempts_left } => println!("{} attempts left", attempts_left),
//!     Attempt::LockedOut(ticket) => {
//!         ticket.wait().await;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gate;
pub mod storage;
pub mod vault;

pub use error::{PinGateError, Result};
pub use gate::{
    Attempt, CredentialGate, ExitProcess, GateState, GateStatus, Terminator, WipeReport,
    WipeScheduler, WipeTicket,
};
pub use storage::{load_config, save_config, FileStore, GateConfig, KeyValueStore, MemoryStore};
pub use vault::{CipherSuite, SecretVault, VaultError};
