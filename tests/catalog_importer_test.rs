// ==========================================
// Catalog importer tests
// ==========================================
// CSV directory → SQLite → eligibility queries
// ==========================================


use std::fs;
use std::path::Path;

use correlativities_engine::api::EnrollmentApi;
use correlativities_engine::domain::SubjectEligibilityStatus;
use correlativities_engine::engine::EnrollmentRepositories;
use correlativities_engine::importer::{CatalogImporter, ImportError};
use correlativities_engine::logging;
use tempfile::TempDir;
use test_helpers::{career, sid, student};

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write csv");
}

fn write_catalog(dir: &Path) {
    write(
        dir,
        "careers.csv",
        "id,title,total_years,total_semesters\n\
         ISI,Ingeniería en Sistemas de Información,5,10\n",
    );
    write(
        dir,
        "subjects.csv",
        "id,name,year,semester,capacity,current_enrollment\n\
         AM1,Análisis Matemático I,1,1,40,\n\
         AGA,Algebra y Geometría Analítica,1,1,40,\n\
         AM2,Análisis Matemático II,2,1,2,\n\
         BAD,Materia inválida,1,3,40,\n",
    );
    write(
        dir,
        "career_subjects.csv",
        "career_id,subject_id,year,semester\n\
         ISI,AM1,1,1\n\
         ISI,AGA,1,1\n\
         ISI,AM2,2,1\n",
    );
    write(
        dir,
        "prerequisites.csv",
        "subject_id,prerequisite_subject_id\n\
         AM2,AM1\n\
         AM2,AGA\n\
         AM1,AM1\n",
    );
    write(
        dir,
        "enrollments.csv",
        "student_id,subject_id,status,enrollment_date\n\
         s1,AM1,completed,2023-07-15\n\
         s1,AGA,active,2024-03-01T10:00:00Z\n\
         s2,AM2,active,\n\
         s3,AM1,graduated,\n",
    );
}

#[tokio::test]
async fn test_import_directory_and_query() {
    logging::init_test();
    let (_tmp, conn) = test_helpers::create_test_db().expect("test db");
    let dir = TempDir::new().expect("temp dir");
    write_catalog(dir.path());

    let importer = CatalogImporter::from_connection(conn.clone());
    let summaries = importer.import_dir(dir.path()).await.expect("import");

    let files: Vec<&str> = summaries.iter().map(|s| s.file.as_str()).collect();
    assert_eq!(
        files,
        vec![
            "careers.csv",
            "subjects.csv",
            "career_subjects.csv",
            "prerequisites.csv",
            "enrollments.csv"
        ]
    );

    let subjects = &summaries[1];
    assert_eq!(subjects.rows_read, 4);
    assert_eq!(subjects.inserted, 3);
    assert_eq!(subjects.rejected.len(), 1);
    assert_eq!(subjects.rejected[0].line, 5);

    // self-edge refused
    let prerequisites = &summaries[3];
    assert_eq!(prerequisites.inserted, 2);
    assert_eq!(prerequisites.rejected.len(), 1);

    // unknown status refused
    let enrollments = &summaries[4];
    assert_eq!(enrollments.inserted, 3);
    assert_eq!(enrollments.rejected.len(), 1);
    assert!(enrollments.rejected[0].reason.contains("graduated"));

    // history follows the seat counter
    assert_eq!(test_helpers::current_enrollment(&conn, "AGA"), 1);
    assert_eq!(test_helpers::current_enrollment(&conn, "AM1"), 0);
    assert_eq!(test_helpers::current_enrollment(&conn, "AM2"), 1);

    let api = EnrollmentApi::new(EnrollmentRepositories::sqlite(conn.clone()));
    let map = api
        .get_eligibility_for_student(&student("s1"), &career("ISI"))
        .await
        .unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map[&sid("AM1")].status, SubjectEligibilityStatus::AlreadyPassed);
    assert_eq!(
        map[&sid("AGA")].status,
        SubjectEligibilityStatus::CurrentlyEnrolled
    );
    assert_eq!(map[&sid("AM2")].status, SubjectEligibilityStatus::Locked);
    let missing: Vec<&str> = map[&sid("AM2")]
        .missing_prerequisites
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(missing, vec!["AGA"]);
}

#[tokio::test]
async fn test_missing_files_are_skipped() {
    let (_tmp, conn) = test_helpers::create_test_db().expect("test db");
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "careers.csv",
        "id,title\nK,Licenciatura en Computación\n",
    );

    let importer = CatalogImporter::from_connection(conn);
    let summaries = importer.import_dir(dir.path()).await.expect("import");

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].inserted, 1);
}

#[tokio::test]
async fn test_missing_required_column_aborts() {
    let (_tmp, conn) = test_helpers::create_test_db().expect("test db");
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "subjects.csv",
        "id,name,year,semester\nAM1,Análisis Matemático I,1,1\n",
    );

    let importer = CatalogImporter::from_connection(conn);
    let err = importer.import_dir(dir.path()).await.unwrap_err();

    match err {
        ImportError::MissingColumn { column, .. } => assert_eq!(column, "capacity"),
        other => panic!("Expected MissingColumn, got {other:?}"),
    }
}
