// ==========================================
// Correlativities Engine - Prerequisite Repository
// ==========================================
// Table: subject_prerequisites
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{PrerequisiteEdge, PrerequisiteId, SubjectId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stores::PrerequisiteStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Prerequisite edge repository
pub struct PrerequisiteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PrerequisiteRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_edge(row: &rusqlite::Row) -> SqliteResult<PrerequisiteEdge> {
        Ok(PrerequisiteEdge {
            id: PrerequisiteId::new(row.get::<_, String>(0)?),
            subject_id: SubjectId::new(row.get::<_, String>(1)?),
            prerequisite_subject_id: SubjectId::new(row.get::<_, String>(2)?),
        })
    }

    fn query_edges(&self, filter: &str, value: Option<&str>) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT id, subject_id, prerequisite_subject_id
            FROM subject_prerequisites
            {}
            ORDER BY created_seq
            "#,
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let edges = match value {
            Some(v) => stmt
                .query_map(params![v], Self::map_edge)?
                .collect::<SqliteResult<Vec<_>>>()?,
            None => stmt
                .query_map([], Self::map_edge)?
                .collect::<SqliteResult<Vec<_>>>()?,
        };
        Ok(edges)
    }

    fn insert_edge(
        &self,
        subject_id: &SubjectId,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<PrerequisiteEdge> {
        if subject_id == prerequisite_id {
            return Err(RepositoryError::ValidationError(format!(
                "subject {} cannot be its own prerequisite",
                subject_id
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(created_seq), 0) + 1 FROM subject_prerequisites",
            [],
            |row| row.get(0),
        )?;

        let edge = PrerequisiteEdge {
            id: PrerequisiteId::new(Uuid::new_v4().to_string()),
            subject_id: subject_id.clone(),
            prerequisite_subject_id: prerequisite_id.clone(),
        };

        tx.execute(
            r#"
            INSERT INTO subject_prerequisites (id, subject_id, prerequisite_subject_id, created_seq)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                edge.id.as_str(),
                edge.subject_id.as_str(),
                edge.prerequisite_subject_id.as_str(),
                next_seq
            ],
        )?;

        tx.commit()?;
        Ok(edge)
    }
}

#[async_trait]
impl PrerequisiteStore for PrerequisiteRepository {
    async fn get_all(&self) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.query_edges("", None)
    }

    async fn get_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.query_edges("WHERE subject_id = ?1", Some(subject_id.as_str()))
    }

    async fn get_subjects_that_require(
        &self,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.query_edges(
            "WHERE prerequisite_subject_id = ?1",
            Some(prerequisite_id.as_str()),
        )
    }

    async fn create(
        &self,
        subject_id: &SubjectId,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<PrerequisiteEdge> {
        self.insert_edge(subject_id, prerequisite_id)
    }

    async fn delete(&self, id: &PrerequisiteId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM subject_prerequisites WHERE id = ?1",
            params![id.as_str()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("SubjectPrerequisite", id));
        }
        Ok(())
    }

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM subject_prerequisites WHERE subject_id = ?1",
            params![subject_id.as_str()],
        )?;
        Ok(())
    }
}
