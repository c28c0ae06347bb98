// ==========================================
// Correlativities Engine - Catalog Importer
// ==========================================
// Seeds careers, subjects, plan placements, prerequisite edges and
// enrollment history from a directory of CSV files.
// Order: careers → subjects → career_subjects → prerequisites → enrollments
// Missing files are skipped; bad rows are rejected with a reason.
// ==========================================

use crate::domain::{
    Career, CareerId, CareerSubject, Enrollment, EnrollmentId, EnrollmentStatus, StudentId,
    Subject, SubjectId,
};
use crate::importer::csv_parser::{CsvParser, RawRow};
use crate::importer::error::ImportResult;
use crate::repository::{
    EnrollmentRepository, PrerequisiteRepository, PrerequisiteStore, SubjectRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const CAREERS_FILE: &str = "careers.csv";
pub const SUBJECTS_FILE: &str = "subjects.csv";
pub const CAREER_SUBJECTS_FILE: &str = "career_subjects.csv";
pub const PREREQUISITES_FILE: &str = "prerequisites.csv";
pub const ENROLLMENTS_FILE: &str = "enrollments.csv";

// ==========================================
// Summaries
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub line: usize,
    pub reason: String,
}

/// Outcome of one CSV file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub file: String,
    pub rows_read: usize,
    pub inserted: usize,
    pub rejected: Vec<RowRejection>,
}

impl ImportSummary {
    fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            ..Self::default()
        }
    }

    fn reject(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(file = %self.file, line, reason = %reason, "row rejected");
        self.rejected.push(RowRejection { line, reason });
    }
}

// ==========================================
// CatalogImporter
// ==========================================
pub struct CatalogImporter {
    subjects: SubjectRepository,
    prerequisites: PrerequisiteRepository,
    enrollments: EnrollmentRepository,
}

impl CatalogImporter {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            subjects: SubjectRepository::from_connection(conn.clone()),
            prerequisites: PrerequisiteRepository::from_connection(conn.clone()),
            enrollments: EnrollmentRepository::from_connection(conn),
        }
    }

    /// Import every known CSV present in `dir`
    ///
    /// # Returns
    /// - Ok(Vec<ImportSummary>): one entry per file found, in import order
    /// - Err: unreadable file or missing required column
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub async fn import_dir(&self, dir: impl AsRef<Path>) -> ImportResult<Vec<ImportSummary>> {
        let dir = dir.as_ref();
        let mut summaries = Vec::new();

        let careers = dir.join(CAREERS_FILE);
        if careers.exists() {
            summaries.push(self.import_careers(&careers)?);
        }
        let subjects = dir.join(SUBJECTS_FILE);
        if subjects.exists() {
            summaries.push(self.import_subjects(&subjects)?);
        }
        let placements = dir.join(CAREER_SUBJECTS_FILE);
        if placements.exists() {
            summaries.push(self.import_career_subjects(&placements)?);
        }
        let prerequisites = dir.join(PREREQUISITES_FILE);
        if prerequisites.exists() {
            summaries.push(self.import_prerequisites(&prerequisites).await?);
        }
        let enrollments = dir.join(ENROLLMENTS_FILE);
        if enrollments.exists() {
            summaries.push(self.import_enrollments(&enrollments)?);
        }

        for summary in &summaries {
            info!(
                file = %summary.file,
                read = summary.rows_read,
                inserted = summary.inserted,
                rejected = summary.rejected.len(),
                "file imported"
            );
        }
        Ok(summaries)
    }

    /// careers.csv: id, title, total_years, total_semesters
    pub fn import_careers(&self, path: &Path) -> ImportResult<ImportSummary> {
        let rows = CsvParser::parse(path, &["id", "title"])?;
        let mut summary = ImportSummary::new(CAREERS_FILE);
        summary.rows_read = rows.len();

        for row in rows {
            let parsed = (|| -> Result<Career, String> {
                Ok(Career {
                    id: CareerId::new(row.require("id")?),
                    title: row.require("title")?.to_string(),
                    total_years: optional_i32(&row, "total_years")?.unwrap_or(0),
                    total_semesters: optional_i32(&row, "total_semesters")?.unwrap_or(0),
                })
            })();
            match parsed {
                Ok(career) => match self.subjects.upsert_career(&career) {
                    Ok(()) => summary.inserted += 1,
                    Err(e) => summary.reject(row.line, e.to_string()),
                },
                Err(reason) => summary.reject(row.line, reason),
            }
        }
        Ok(summary)
    }

    /// subjects.csv: id, name, year, semester, capacity[, current_enrollment]
    pub fn import_subjects(&self, path: &Path) -> ImportResult<ImportSummary> {
        let rows = CsvParser::parse(path, &["id", "name", "year", "semester", "capacity"])?;
        let mut summary = ImportSummary::new(SUBJECTS_FILE);
        summary.rows_read = rows.len();

        for row in rows {
            let parsed = (|| -> Result<Subject, String> {
                let subject = Subject {
                    id: SubjectId::new(row.require("id")?),
                    name: row.require("name")?.to_string(),
                    year: row.require_i32("year")?,
                    semester: row.require_i32("semester")?,
                    capacity: row.require_i32("capacity")?,
                    current_enrollment: optional_i32(&row, "current_enrollment")?.unwrap_or(0),
                };
                subject.validate()?;
                Ok(subject)
            })();
            match parsed {
                Ok(subject) => match self.subjects.upsert_subject(&subject) {
                    Ok(()) => summary.inserted += 1,
                    Err(e) => summary.reject(row.line, e.to_string()),
                },
                Err(reason) => summary.reject(row.line, reason),
            }
        }
        Ok(summary)
    }

    /// career_subjects.csv: career_id, subject_id, year, semester
    pub fn import_career_subjects(&self, path: &Path) -> ImportResult<ImportSummary> {
        let rows = CsvParser::parse(path, &["career_id", "subject_id", "year", "semester"])?;
        let mut summary = ImportSummary::new(CAREER_SUBJECTS_FILE);
        summary.rows_read = rows.len();

        for row in rows {
            let parsed = (|| -> Result<CareerSubject, String> {
                Ok(CareerSubject {
                    career_id: CareerId::new(row.require("career_id")?),
                    subject_id: SubjectId::new(row.require("subject_id")?),
                    year: row.require_i32("year")?,
                    semester: row.require_i32("semester")?,
                })
            })();
            match parsed {
                Ok(placement) => match self.subjects.assign_subject(&placement) {
                    Ok(()) => summary.inserted += 1,
                    Err(e) => summary.reject(row.line, e.to_string()),
                },
                Err(reason) => summary.reject(row.line, reason),
            }
        }
        Ok(summary)
    }

    /// prerequisites.csv: subject_id, prerequisite_subject_id
    pub async fn import_prerequisites(&self, path: &Path) -> ImportResult<ImportSummary> {
        let rows = CsvParser::parse(path, &["subject_id", "prerequisite_subject_id"])?;
        let mut summary = ImportSummary::new(PREREQUISITES_FILE);
        summary.rows_read = rows.len();

        for row in rows {
            let parsed = row.require("subject_id").and_then(|subject| {
                row.require("prerequisite_subject_id")
                    .map(|prerequisite| (SubjectId::new(subject), SubjectId::new(prerequisite)))
            });
            match parsed {
                Ok((subject, prerequisite)) => {
                    match self.prerequisites.create(&subject, &prerequisite).await {
                        Ok(_) => summary.inserted += 1,
                        Err(e) => summary.reject(row.line, e.to_string()),
                    }
                }
                Err(reason) => summary.reject(row.line, reason),
            }
        }
        Ok(summary)
    }

    /// enrollments.csv: student_id, subject_id, status[, enrollment_date][, id]
    ///
    /// History rows bypass the capacity check; the seat counter still
    /// follows each row's status.
    pub fn import_enrollments(&self, path: &Path) -> ImportResult<ImportSummary> {
        let rows = CsvParser::parse(path, &["student_id", "subject_id", "status"])?;
        let mut summary = ImportSummary::new(ENROLLMENTS_FILE);
        summary.rows_read = rows.len();

        for row in rows {
            let parsed = (|| -> Result<Enrollment, String> {
                let status: EnrollmentStatus = row
                    .require("status")?
                    .parse()
                    .map_err(|e: crate::domain::ParseStatusError| e.to_string())?;
                let enrollment_date = match row.get("enrollment_date") {
                    Some(raw) => parse_date(raw)?,
                    None => Utc::now(),
                };
                Ok(Enrollment {
                    id: EnrollmentId::new(
                        row.get("id")
                            .map(str::to_string)
                            .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    ),
                    student_id: StudentId::new(row.require("student_id")?),
                    subject_id: SubjectId::new(row.require("subject_id")?),
                    status,
                    enrollment_date,
                })
            })();
            match parsed {
                Ok(enrollment) => match self.enrollments.import_record(&enrollment) {
                    Ok(()) => summary.inserted += 1,
                    Err(e) => summary.reject(row.line, e.to_string()),
                },
                Err(reason) => summary.reject(row.line, reason),
            }
        }
        Ok(summary)
    }
}

fn optional_i32(row: &RawRow, column: &str) -> Result<Option<i32>, String> {
    match row.get(column) {
        Some(_) => row.require_i32(column).map(Some),
        None => Ok(None),
    }
}

/// RFC 3339 timestamp or plain YYYY-MM-DD (midnight UTC)
fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("enrollment_date {} is not a date", raw))
}
