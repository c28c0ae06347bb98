// ==========================================
// Correlativities Engine - Catalog Entities
// ==========================================
// Subject metadata, careers and career plan placements.
// ==========================================

use crate::domain::types::{CareerId, SubjectId};
use serde::{Deserialize, Serialize};

// ==========================================
// Subject
// ==========================================
/// A subject of the catalog.
///
/// `current_enrollment` counts records that currently occupy a seat; it is
/// maintained by the enrollment store, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub year: i32,     // >= 1
    pub semester: i32, // 1 or 2
    pub capacity: i32, // > 0
    pub current_enrollment: i32,
}

impl Subject {
    /// Capacity figures, reported independently of eligibility status
    pub fn capacity_info(&self) -> CapacityInfo {
        CapacityInfo::new(self.capacity, self.current_enrollment)
    }

    /// Validate catalog invariants before writing
    ///
    /// # Returns
    /// - Ok(()): all attributes in range
    /// - Err(String): first violated rule
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_blank() {
            return Err("subject id is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("subject {} has no name", self.id));
        }
        if self.year < 1 {
            return Err(format!("subject {}: year must be >= 1 (got {})", self.id, self.year));
        }
        if !(1..=2).contains(&self.semester) {
            return Err(format!(
                "subject {}: semester must be 1 or 2 (got {})",
                self.id, self.semester
            ));
        }
        if self.capacity <= 0 {
            return Err(format!(
                "subject {}: capacity must be > 0 (got {})",
                self.id, self.capacity
            ));
        }
        if self.current_enrollment < 0 {
            return Err(format!(
                "subject {}: current_enrollment must be >= 0 (got {})",
                self.id, self.current_enrollment
            ));
        }
        Ok(())
    }
}

// ==========================================
// CapacityInfo
// ==========================================
/// Seat availability of a subject at read time.
///
/// Orthogonal to eligibility status: an AVAILABLE subject may be full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityInfo {
    pub capacity: i32,
    pub current_enrollment: i32,
    pub has_capacity: bool,
    pub available_spots: i32,
}

impl CapacityInfo {
    pub fn new(capacity: i32, current_enrollment: i32) -> Self {
        Self {
            capacity,
            current_enrollment,
            has_capacity: current_enrollment < capacity,
            available_spots: capacity - current_enrollment,
        }
    }
}

// ==========================================
// Career
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    pub id: CareerId,
    pub title: String,
    pub total_years: i32,
    pub total_semesters: i32,
}

/// Placement of a subject inside a career plan.
///
/// The same subject may sit at different (year, semester) in different careers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerSubject {
    pub career_id: CareerId,
    pub subject_id: SubjectId,
    pub year: i32,
    pub semester: i32,
}
