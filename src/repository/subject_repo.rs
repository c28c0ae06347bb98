// ==========================================
// Correlativities Engine - Catalog Repository
// ==========================================
// Tables: subjects, careers, career_subjects
// No business logic; parameterized queries only.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{CapacityInfo, Career, CareerId, CareerSubject, Subject, SubjectId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stores::CatalogStore;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// SubjectRepository
// ==========================================
/// Catalog repository: subjects, careers and career plan placements
pub struct SubjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubjectRepository {
    /// Open a repository on its own connection
    ///
    /// # Arguments
    /// - db_path: database file path
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build from a shared connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_subject(row: &rusqlite::Row) -> SqliteResult<Subject> {
        Ok(Subject {
            id: SubjectId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            year: row.get(2)?,
            semester: row.get(3)?,
            capacity: row.get(4)?,
            current_enrollment: row.get(5)?,
        })
    }

    // ===== Careers =====

    /// Insert or replace a career
    pub fn upsert_career(&self, career: &Career) -> RepositoryResult<()> {
        if career.id.is_blank() || career.title.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "career id and title are required".to_string(),
            ));
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO careers (id, title, total_years, total_semesters)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                total_years = excluded.total_years,
                total_semesters = excluded.total_semesters
            "#,
            params![
                career.id.as_str(),
                career.title,
                career.total_years,
                career.total_semesters
            ],
        )?;
        Ok(())
    }

    // ===== Subjects =====

    /// Insert or update subject metadata
    ///
    /// `current_enrollment` is only written on insert; afterwards the
    /// enrollment repository owns the counter.
    pub fn upsert_subject(&self, subject: &Subject) -> RepositoryResult<()> {
        subject.validate().map_err(RepositoryError::ValidationError)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO subjects (id, name, year, semester, capacity, current_enrollment)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                year = excluded.year,
                semester = excluded.semester,
                capacity = excluded.capacity
            "#,
            params![
                subject.id.as_str(),
                subject.name,
                subject.year,
                subject.semester,
                subject.capacity,
                subject.current_enrollment,
            ],
        )?;
        Ok(())
    }

    /// Place a subject in a career plan (replaces an earlier placement)
    pub fn assign_subject(&self, placement: &CareerSubject) -> RepositoryResult<()> {
        if !(1..=2).contains(&placement.semester) || placement.year < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "year/semester".to_string(),
                message: format!(
                    "invalid placement year={} semester={}",
                    placement.year, placement.semester
                ),
            });
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO career_subjects (career_id, subject_id, year, semester)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                placement.career_id.as_str(),
                placement.subject_id.as_str(),
                placement.year,
                placement.semester,
            ],
        )?;
        Ok(())
    }

    fn query_subjects_by_career(&self, career_id: &CareerId) -> RepositoryResult<Vec<Subject>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.name, cs.year, cs.semester, s.capacity, s.current_enrollment
            FROM career_subjects cs
            JOIN subjects s ON s.id = cs.subject_id
            WHERE cs.career_id = ?1
            ORDER BY cs.year, cs.semester, s.name, s.id
            "#,
        )?;
        let subjects = stmt
            .query_map(params![career_id.as_str()], Self::map_subject)?
            .collect::<SqliteResult<Vec<Subject>>>()?;
        Ok(subjects)
    }

    fn query_subject(&self, subject_id: &SubjectId) -> RepositoryResult<Option<Subject>> {
        let conn = self.get_conn()?;
        let subject = conn
            .query_row(
                r#"
                SELECT id, name, year, semester, capacity, current_enrollment
                FROM subjects WHERE id = ?1
                "#,
                params![subject_id.as_str()],
                Self::map_subject,
            )
            .optional()?;
        Ok(subject)
    }

    fn query_subjects(&self, subject_ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>> {
        if subject_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; subject_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, name, year, semester, capacity, current_enrollment
            FROM subjects WHERE id IN ({})
            ORDER BY year, semester, name, id
            "#,
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let subjects = stmt
            .query_map(
                params_from_iter(subject_ids.iter().map(|id| id.as_str())),
                Self::map_subject,
            )?
            .collect::<SqliteResult<Vec<Subject>>>()?;
        Ok(subjects)
    }
}

#[async_trait]
impl CatalogStore for SubjectRepository {
    async fn subjects_by_career(&self, career_id: &CareerId) -> RepositoryResult<Vec<Subject>> {
        self.query_subjects_by_career(career_id)
    }

    async fn find_subjects(&self, subject_ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>> {
        self.query_subjects(subject_ids)
    }

    async fn subject_capacity(
        &self,
        subject_id: &SubjectId,
    ) -> RepositoryResult<Option<CapacityInfo>> {
        Ok(self
            .query_subject(subject_id)?
            .map(|subject| subject.capacity_info()))
    }
}
