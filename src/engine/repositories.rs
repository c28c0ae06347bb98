// ==========================================
// Correlativities Engine - Store Aggregate
// ==========================================
// Bundles the three store ports so engines take one constructor argument.
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    CatalogStore, EnrollmentRepository, EnrollmentStore, PrerequisiteRepository,
    PrerequisiteStore, SubjectRepository,
};

/// Stores consumed by the engines
///
/// Held as trait objects so tests can swap in in-memory stores.
#[derive(Clone)]
pub struct EnrollmentRepositories {
    pub catalog: Arc<dyn CatalogStore>,
    pub prerequisites: Arc<dyn PrerequisiteStore>,
    pub enrollments: Arc<dyn EnrollmentStore>,
}

impl EnrollmentRepositories {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        prerequisites: Arc<dyn PrerequisiteStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            catalog,
            prerequisites,
            enrollments,
        }
    }

    /// SQLite-backed stores sharing one connection
    pub fn sqlite(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            catalog: Arc::new(SubjectRepository::from_connection(conn.clone())),
            prerequisites: Arc::new(PrerequisiteRepository::from_connection(conn.clone())),
            enrollments: Arc::new(EnrollmentRepository::from_connection(conn)),
        }
    }
}
