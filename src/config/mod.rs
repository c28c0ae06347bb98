// ==========================================
// Correlativities Engine - Config Layer
// ==========================================
// Storage: config_kv table
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;

pub use config_manager::{config_keys, ConfigManager, DEFAULT_LOCALE};
pub use engine_config_trait::{ConfigResult, EngineConfigReader};
