// ==========================================
// In-memory stores for engine unit tests
// ==========================================

use crate::domain::{
    CapacityInfo, CareerId, CareerSubject, Enrollment, EnrollmentId, EnrollmentStatus,
    NewEnrollment, PrerequisiteEdge, PrerequisiteId, StudentId, Subject, SubjectId,
};
use crate::engine::EnrollmentRepositories;
use crate::repository::{
    CatalogStore, EnrollmentStore, PrerequisiteStore, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    subjects: Vec<Subject>,
    placements: Vec<CareerSubject>,
    edges: Vec<PrerequisiteEdge>,
    enrollments: Vec<Enrollment>,
    next_id: u64,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    failing_subjects: Mutex<HashSet<SubjectId>>,
    create_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every create sleeps first, so concurrent creates overlap
    pub fn with_create_delay(delay: Duration) -> Self {
        Self {
            create_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn repositories(self: &Arc<Self>) -> EnrollmentRepositories {
        EnrollmentRepositories::new(self.clone(), self.clone(), self.clone())
    }

    pub fn add_subject(&self, id: &str, name: &str, year: i32, semester: i32, capacity: i32) {
        let mut state = self.state.lock().unwrap();
        state.subjects.push(Subject {
            id: SubjectId::new(id),
            name: name.to_string(),
            year,
            semester,
            capacity,
            current_enrollment: 0,
        });
    }

    /// Place a subject in a career at its catalog year/semester
    pub fn place(&self, career: &str, subject: &str) {
        let mut state = self.state.lock().unwrap();
        let (year, semester) = state
            .subjects
            .iter()
            .find(|s| s.id.as_str() == subject)
            .map(|s| (s.year, s.semester))
            .unwrap_or((1, 1));
        state.placements.push(CareerSubject {
            career_id: CareerId::new(career),
            subject_id: SubjectId::new(subject),
            year,
            semester,
        });
    }

    pub fn require(&self, subject: &str, prerequisite: &str) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = PrerequisiteId::new(format!("p{}", state.next_id));
        state.edges.push(PrerequisiteEdge {
            id,
            subject_id: SubjectId::new(subject),
            prerequisite_subject_id: SubjectId::new(prerequisite),
        });
    }

    /// Insert a record directly, bypassing capacity
    pub fn record(&self, student: &str, subject: &str, status: EnrollmentStatus) -> EnrollmentId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = EnrollmentId::new(format!("e{}", state.next_id));
        state.enrollments.push(Enrollment {
            id: id.clone(),
            student_id: StudentId::new(student),
            subject_id: SubjectId::new(subject),
            status,
            enrollment_date: Utc::now(),
        });
        if status.occupies_seat() {
            Self::shift_seats(&mut state, &SubjectId::new(subject), 1);
        }
        id
    }

    pub fn set_current_enrollment(&self, subject: &str, current: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(s) = state.subjects.iter_mut().find(|s| s.id.as_str() == subject) {
            s.current_enrollment = current;
        }
    }

    pub fn current_enrollment(&self, subject: &str) -> i32 {
        let state = self.state.lock().unwrap();
        state
            .subjects
            .iter()
            .find(|s| s.id.as_str() == subject)
            .map(|s| s.current_enrollment)
            .unwrap_or(0)
    }

    pub fn enrollment_count(&self) -> usize {
        self.state.lock().unwrap().enrollments.len()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Capacity lookups for this subject fail
    pub fn fail_subject(&self, subject: &str) {
        self.failing_subjects
            .lock()
            .unwrap()
            .insert(SubjectId::new(subject));
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> RepositoryResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseQueryError(
                "injected read failure".to_string(),
            ));
        }
        Ok(())
    }

    fn shift_seats(state: &mut State, subject_id: &SubjectId, delta: i32) {
        if let Some(s) = state.subjects.iter_mut().find(|s| &s.id == subject_id) {
            s.current_enrollment = (s.current_enrollment + delta).max(0);
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn subjects_by_career(&self, career_id: &CareerId) -> RepositoryResult<Vec<Subject>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        let mut subjects: Vec<Subject> = state
            .placements
            .iter()
            .filter(|p| &p.career_id == career_id)
            .filter_map(|p| {
                state.subjects.iter().find(|s| s.id == p.subject_id).map(|s| Subject {
                    year: p.year,
                    semester: p.semester,
                    ..s.clone()
                })
            })
            .collect();
        subjects.sort_by(|a, b| {
            (a.year, a.semester, &a.name, &a.id).cmp(&(b.year, b.semester, &b.name, &b.id))
        });
        Ok(subjects)
    }

    async fn find_subjects(&self, subject_ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .subjects
            .iter()
            .filter(|s| subject_ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn subject_capacity(
        &self,
        subject_id: &SubjectId,
    ) -> RepositoryResult<Option<CapacityInfo>> {
        self.check_reads()?;
        if self.failing_subjects.lock().unwrap().contains(subject_id) {
            return Err(RepositoryError::DatabaseQueryError(format!(
                "injected failure for {}",
                subject_id
            )));
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .subjects
            .iter()
            .find(|s| &s.id == subject_id)
            .map(Subject::capacity_info))
    }
}

#[async_trait]
impl PrerequisiteStore for InMemoryStore {
    async fn get_all(&self) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().edges.clone())
    }

    async fn get_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .edges
            .iter()
            .filter(|e| &e.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn get_subjects_that_require(
        &self,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<Vec<PrerequisiteEdge>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .edges
            .iter()
            .filter(|e| &e.prerequisite_subject_id == prerequisite_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        subject_id: &SubjectId,
        prerequisite_id: &SubjectId,
    ) -> RepositoryResult<PrerequisiteEdge> {
        self.require(subject_id.as_str(), prerequisite_id.as_str());
        let state = self.state.lock().unwrap();
        state
            .edges
            .last()
            .cloned()
            .ok_or_else(|| RepositoryError::InternalError("edge not stored".to_string()))
    }

    async fn delete(&self, id: &PrerequisiteId) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.edges.len();
        state.edges.retain(|e| &e.id != id);
        if state.edges.len() == before {
            return Err(RepositoryError::not_found("SubjectPrerequisite", id));
        }
        Ok(())
    }

    async fn delete_by_subject(&self, subject_id: &SubjectId) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.edges.retain(|e| &e.subject_id != subject_id);
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn list_by_student(&self, student_id: &StudentId) -> RepositoryResult<Vec<Enrollment>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .filter(|e| &e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn find_by_student_and_subject(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> RepositoryResult<Option<Enrollment>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .find(|e| &e.student_id == student_id && &e.subject_id == subject_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &EnrollmentId) -> RepositoryResult<Option<Enrollment>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state.enrollments.iter().find(|e| &e.id == id).cloned())
    }

    async fn create_within_capacity(
        &self,
        enrollment: NewEnrollment,
    ) -> RepositoryResult<Enrollment> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            let seats = state
                .subjects
                .iter()
                .find(|s| s.id == enrollment.subject_id)
                .map(|s| (s.capacity, s.current_enrollment));
            match seats {
                None => Err(RepositoryError::not_found("Subject", &enrollment.subject_id)),
                Some((capacity, current_enrollment)) if current_enrollment >= capacity => {
                    Err(RepositoryError::CapacityExceeded {
                        subject_id: enrollment.subject_id.to_string(),
                        capacity,
                        current_enrollment,
                    })
                }
                Some(_)
                    if state.enrollments.iter().any(|e| {
                        e.student_id == enrollment.student_id
                            && e.subject_id == enrollment.subject_id
                    }) =>
                {
                    Err(RepositoryError::UniqueConstraintViolation(
                        "enrollments(student_id, subject_id)".to_string(),
                    ))
                }
                Some(_) => {
                    state.next_id += 1;
                    let record = Enrollment {
                        id: EnrollmentId::new(format!("e{}", state.next_id)),
                        student_id: enrollment.student_id,
                        subject_id: enrollment.subject_id,
                        status: enrollment.status,
                        enrollment_date: Utc::now(),
                    };
                    if record.status.occupies_seat() {
                        Self::shift_seats(&mut state, &record.subject_id, 1);
                    }
                    state.enrollments.push(record.clone());
                    Ok(record)
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn change_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .enrollments
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| RepositoryError::not_found("Enrollment", id))?;
        let previous = state.enrollments[index].status;
        let subject_id = state.enrollments[index].subject_id.clone();
        let delta = i32::from(status.occupies_seat()) - i32::from(previous.occupies_seat());
        if delta > 0 {
            if let Some(subject) = state.subjects.iter().find(|s| s.id == subject_id) {
                if subject.current_enrollment >= subject.capacity {
                    return Err(RepositoryError::CapacityExceeded {
                        subject_id: subject_id.to_string(),
                        capacity: subject.capacity,
                        current_enrollment: subject.current_enrollment,
                    });
                }
            }
        }
        state.enrollments[index].status = status;
        Self::shift_seats(&mut state, &subject_id, delta);
        Ok(state.enrollments[index].clone())
    }
}
