// ==========================================
// Correlativities Engine - Engine Config Reader Trait
// ==========================================
// Read-only interface; no writes, no business logic
// Implementors: ConfigManager (config_kv table), test mocks
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// EngineConfigReader Trait
// ==========================================
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// Bound on concurrent record creations during bulk enrollment
    ///
    /// # Default
    /// - 4 (values below 1 are raised to 1)
    async fn bulk_max_concurrent(&self) -> ConfigResult<usize>;

    /// Locale for user-facing messages
    ///
    /// # Default
    /// - "es"
    async fn default_locale(&self) -> ConfigResult<String>;

    /// Whether graph builds run cycle detection
    ///
    /// # Default
    /// - true
    async fn report_cycles(&self) -> ConfigResult<bool>;
}
