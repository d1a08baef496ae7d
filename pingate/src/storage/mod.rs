mod config;
mod file;
mod kv;

pub use config::{load_config, save_config, GateConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_WIPE_DELAY_MS};
pub use file::{FileStore, STORE_FILE_NAME};
pub use kv::{KeyValueStore, MemoryStore};
