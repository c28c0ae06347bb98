// ==========================================
// Correlativities Engine - Config Manager
// ==========================================
// Storage: config_kv table (key-value + scope), scope 'global'
// ==========================================

use crate::config::engine_config_trait::{ConfigResult, EngineConfigReader};
use crate::db::open_sqlite_connection;
use crate::engine::DEFAULT_BULK_MAX_CONCURRENT;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_LOCALE: &str = "es";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// # Arguments
    /// - db_path: database file path
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build from a shared connection
    ///
    /// PRAGMAs are re-applied (idempotent) so every handle behaves alike.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("lock failed: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Read a value from config_kv (scope_id='global')
    ///
    /// # Returns
    /// - Some(String): stored value
    /// - None: key not set
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// Insert or overwrite a global value
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// All global values as a JSON object, keys sorted
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn bulk_max_concurrent(&self) -> ConfigResult<usize> {
        let raw = self.get_config_or_default(
            config_keys::BULK_MAX_CONCURRENT,
            &DEFAULT_BULK_MAX_CONCURRENT.to_string(),
        )?;
        let value: usize = raw
            .trim()
            .parse()
            .map_err(|e| format!("invalid {}: {} ({})", config_keys::BULK_MAX_CONCURRENT, raw, e))?;
        Ok(value.max(1))
    }

    async fn default_locale(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::DEFAULT_LOCALE, DEFAULT_LOCALE)?;
        let value = value.trim();
        if value.is_empty() {
            return Ok(DEFAULT_LOCALE.to_string());
        }
        Ok(value.to_string())
    }

    async fn report_cycles(&self) -> ConfigResult<bool> {
        let raw = self.get_config_or_default(config_keys::REPORT_CYCLES, "true")?;
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(format!("invalid {}: {}", config_keys::REPORT_CYCLES, other).into()),
        }
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // Bulk enrollment
    pub const BULK_MAX_CONCURRENT: &str = "bulk_enroll.max_concurrent";

    // Messages
    pub const DEFAULT_LOCALE: &str = "i18n.default_locale";

    // Graph
    pub const REPORT_CYCLES: &str = "graph.report_cycles";
}
