// ==========================================
// Correlativities Engine - Enrollment Repository
// ==========================================
// Table: enrollments (+ subjects.current_enrollment counter)
// Seat accounting happens in the same IMMEDIATE transaction as the
// enrollment write, so the capacity check cannot be raced.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment, StudentId, SubjectId,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stores::EnrollmentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, TransactionBehavior,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Enrollment repository
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
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

    fn map_enrollment(row: &rusqlite::Row) -> SqliteResult<Enrollment> {
        let status_str: String = row.get(3)?;
        let status = status_str
            .parse::<EnrollmentStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(Enrollment {
            id: EnrollmentId::new(row.get::<_, String>(0)?),
            student_id: StudentId::new(row.get::<_, String>(1)?),
            subject_id: SubjectId::new(row.get::<_, String>(2)?),
            status,
            enrollment_date: row.get::<_, DateTime<Utc>>(4)?,
        })
    }

    fn query_by_id(conn: &Connection, id: &EnrollmentId) -> RepositoryResult<Option<Enrollment>> {
        let enrollment = conn
            .query_row(
                r#"
                SELECT id, student_id, subject_id, status, enrollment_date
                FROM enrollments WHERE id = ?1
                "#,
                params![id.as_str()],
                Self::map_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    /// Fail with CapacityExceeded when the subject has no free seat
    fn ensure_free_seat(conn: &Connection, subject_id: &SubjectId) -> RepositoryResult<()> {
        let seats: Option<(i32, i32)> = conn
            .query_row(
                "SELECT capacity, current_enrollment FROM subjects WHERE id = ?1",
                params![subject_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (capacity, current_enrollment) =
            seats.ok_or_else(|| RepositoryError::not_found("Subject", subject_id))?;

        if current_enrollment >= capacity {
            return Err(RepositoryError::CapacityExceeded {
                subject_id: subject_id.to_string(),
                capacity,
                current_enrollment,
            });
        }
        Ok(())
    }

    /// Shift `current_enrollment` by `delta`, never below zero
    fn adjust_seats(conn: &Connection, subject_id: &SubjectId, delta: i32) -> RepositoryResult<()> {
        if delta == 0 {
            return Ok(());
        }
        conn.execute(
            r#"
            UPDATE subjects
            SET current_enrollment = MAX(0, current_enrollment + ?1)
            WHERE id = ?2
            "#,
            params![delta, subject_id.as_str()],
        )?;
        Ok(())
    }

    /// Record an existing enrollment without a capacity check
    ///
    /// Used when loading enrollment history; the seat counter is still
    /// kept in step with the record's status.
    pub fn import_record(&self, enrollment: &Enrollment) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT status FROM enrollments WHERE student_id = ?1 AND subject_id = ?2",
                params![enrollment.student_id.as_str(), enrollment.subject_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let previous_occupies = previous
            .as_deref()
            .and_then(|s| s.parse::<EnrollmentStatus>().ok())
            .map(|s| s.occupies_seat())
            .unwrap_or(false);

        tx.execute(
            r#"
            INSERT INTO enrollments (id, student_id, subject_id, status, enrollment_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(student_id, subject_id) DO UPDATE SET
                status = excluded.status,
                enrollment_date = excluded.enrollment_date
            "#,
            params![
                enrollment.id.as_str(),
                enrollment.student_id.as_str(),
                enrollment.subject_id.as_str(),
                enrollment.status.to_db_str(),
                enrollment.enrollment_date,
            ],
        )?;

        let delta = i32::from(enrollment.status.occupies_seat()) - i32::from(previous_occupies);
        Self::adjust_seats(&tx, &enrollment.subject_id, delta)?;

        tx.commit()?;
        Ok(())
    }

    fn insert_within_capacity(&self, new: NewEnrollment) -> RepositoryResult<Enrollment> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        Self::ensure_free_seat(&tx, &new.subject_id)?;

        let enrollment = Enrollment {
            id: EnrollmentId::new(Uuid::new_v4().to_string()),
            student_id: new.student_id,
            subject_id: new.subject_id,
            status: new.status,
            enrollment_date: Utc::now(),
        };

        tx.execute(
            r#"
            INSERT INTO enrollments (id, student_id, subject_id, status, enrollment_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                enrollment.id.as_str(),
                enrollment.student_id.as_str(),
                enrollment.subject_id.as_str(),
                enrollment.status.to_db_str(),
                enrollment.enrollment_date,
            ],
        )?;

        if enrollment.status.occupies_seat() {
            Self::adjust_seats(&tx, &enrollment.subject_id, 1)?;
        }

        tx.commit()?;
        Ok(enrollment)
    }

    fn update_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut enrollment =
            Self::query_by_id(&tx, id)?.ok_or_else(|| RepositoryError::not_found("Enrollment", id))?;

        // re-activation takes a seat, so it goes through the same guard
        let delta = i32::from(status.occupies_seat()) - i32::from(enrollment.status.occupies_seat());
        if delta > 0 {
            Self::ensure_free_seat(&tx, &enrollment.subject_id)?;
        }

        tx.execute(
            "UPDATE enrollments SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), id.as_str()],
        )?;
        Self::adjust_seats(&tx, &enrollment.subject_id, delta)?;

        tx.commit()?;
        enrollment.status = status;
        Ok(enrollment)
    }
}

#[async_trait]
impl EnrollmentStore for EnrollmentRepository {
    async fn list_by_student(&self, student_id: &StudentId) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, student_id, subject_id, status, enrollment_date
            FROM enrollments
            WHERE student_id = ?1
            ORDER BY enrollment_date
            "#,
        )?;
        let enrollments = stmt
            .query_map(params![student_id.as_str()], Self::map_enrollment)?
            .collect::<SqliteResult<Vec<Enrollment>>>()?;
        Ok(enrollments)
    }

    async fn find_by_student_and_subject(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> RepositoryResult<Option<Enrollment>> {
        let conn = self.get_conn()?;
        let enrollment = conn
            .query_row(
                r#"
                SELECT id, student_id, subject_id, status, enrollment_date
                FROM enrollments
                WHERE student_id = ?1 AND subject_id = ?2
                "#,
                params![student_id.as_str(), subject_id.as_str()],
                Self::map_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    async fn find_by_id(&self, id: &EnrollmentId) -> RepositoryResult<Option<Enrollment>> {
        let conn = self.get_conn()?;
        Self::query_by_id(&conn, id)
    }

    async fn create_within_capacity(
        &self,
        enrollment: NewEnrollment,
    ) -> RepositoryResult<Enrollment> {
        self.insert_within_capacity(enrollment)
    }

    async fn change_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment> {
        self.update_status(id, status)
    }
}
