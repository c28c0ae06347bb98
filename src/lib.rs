// ==========================================
// Correlativities Engine - Core Library
// ==========================================
// Enrollment eligibility and correlativities (prerequisite) rules for
// university careers.
// Stack: Rust + SQLite
// ==========================================

// Message catalogs
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// Modules
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - store ports and SQLite adapters
pub mod repository;

// Engine layer - business rules
pub mod engine;

// Import layer - CSV catalog seeding
pub mod importer;

// Config layer
pub mod config;

// Database infrastructure (connection setup, schema)
pub mod db;

pub mod logging;

pub mod i18n;

// API layer - caller-facing operations
pub mod api;

// Application layer - service wiring
pub mod app;

// ==========================================
// Re-exports
// ==========================================

// Domain types
pub use domain::types::{
    CareerId, EnrollmentId, EnrollmentStatus, PrerequisiteId, StudentId,
    SubjectEligibilityStatus, SubjectId,
};

// Domain entities
pub use domain::{
    BulkEnrollmentResult, CapacityInfo, Career, CorrelativitiesGraph, Enrollment,
    EnrollmentDecision, EnrollmentRejection, Subject, SubjectEligibility,
};

// Engines
pub use engine::{
    CorrelativitiesGraphBuilder, EligibilityCore, EligibilityEngine, EnrollmentGatekeeper,
    EnrollmentRepositories,
};

// API
pub use api::{ApiError, EnrollmentApi};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "correlativities";
