use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PinGateError, Result};
use crate::vault::CipherSuite;

/// Attempts granted after enrollment and after every successful unlock.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between entering lockout and wiping the store.
pub const DEFAULT_WIPE_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub max_attempts: u32,
    pub wipe_delay_ms: u64,
    /// Cipher used for new enrollments. Existing vaults keep their own.
    pub cipher: CipherSuite,
    pub min_secret_len: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wipe_delay_ms: DEFAULT_WIPE_DELAY_MS,
            cipher: CipherSuite::default(),
            min_secret_len: 1,
        }
    }
}

impl GateConfig {
    pub fn wipe_delay(&self) -> Duration {
        Duration::from_millis(self.wipe_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PinGateError::Config(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.min_secret_len == 0 {
            return Err(PinGateError::Config(
                "min_secret_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<GateConfig> {
    if !path.exists() {
        return Ok(GateConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: GateConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &GateConfig) -> Result<()> {
    config.validate()?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
