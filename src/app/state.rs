// ==========================================
// Correlativities Engine - Application State
// ==========================================
// Wires one shared SQLite connection into the repositories, the config
// manager, the enrollment API and the catalog importer.
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::EnrollmentApi;
use crate::config::{ConfigManager, EngineConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::EnrollmentRepositories;
use crate::importer::CatalogImporter;
use rusqlite::Connection;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "CORRELATIVITIES_DB";

/// Shared services for one database
pub struct AppState {
    pub db_path: PathBuf,
    pub conn: Arc<Mutex<Connection>>,
    pub config: Arc<ConfigManager>,
    pub enrollment_api: Arc<EnrollmentApi>,
    pub importer: Arc<CatalogImporter>,
}

impl AppState {
    /// Open (and if needed create) the database and build every service
    ///
    /// # Returns
    /// - Ok(AppState)
    /// - Err(String): database or configuration failure
    pub async fn new(db_path: &Path) -> Result<Self, String> {
        tracing::info!(db_path = %db_path.display(), "initializing application state");

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }

        let conn = open_sqlite_connection(&db_path.to_string_lossy())
            .map_err(|e| format!("cannot open database: {}", e))?;
        init_schema(&conn).map_err(|e| format!("schema initialization failed: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("config manager: {}", e))?,
        );

        let repos = EnrollmentRepositories::sqlite(conn.clone());
        let enrollment_api = EnrollmentApi::from_config(repos, config.as_ref())
            .await
            .map_err(|e| e.to_string())?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
            importer: Arc::new(CatalogImporter::from_connection(conn.clone())),
            enrollment_api: Arc::new(enrollment_api),
            config,
            conn,
        })
    }

    /// Locale stored in configuration
    pub async fn configured_locale(&self) -> String {
        match self.config.default_locale().await {
            Ok(locale) => locale,
            Err(e) => {
                tracing::warn!(error = %e, "locale unavailable, using default");
                crate::config::DEFAULT_LOCALE.to_string()
            }
        }
    }
}

/// Database path: explicit value, then `CORRELATIVITIES_DB`, then the
/// platform data directory (`<data_dir>/correlativities/correlativities.db`).
pub fn get_default_db_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join("correlativities"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("correlativities.db")
}
