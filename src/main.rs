// ==========================================
// Correlativities Engine - CLI entry point
// ==========================================
// Output: pretty JSON on stdout; logs on stderr; exit code 1 on error
// ==========================================

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use correlativities_engine::app::{get_default_db_path, AppState};
use correlativities_engine::domain::{
    CareerId, EnrollmentDecision, EnrollmentId, EnrollmentStatus, StudentId, SubjectId,
};
use correlativities_engine::{i18n, logging, EnrollmentApi};

#[derive(Parser, Debug)]
#[command(name = "correlativities", version, about = "Enrollment eligibility and correlativities engine")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "CORRELATIVITIES_DB")]
    db: Option<String>,

    /// Message language (es, en); defaults to the configured locale
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    InitDb,

    /// Import careers, subjects, placements, prerequisites and enrollments from CSV files
    Import {
        /// Directory holding the CSV files
        dir: PathBuf,
    },

    /// Eligibility of every subject of a career
    Eligibility {
        #[arg(long)]
        student: String,
        #[arg(long)]
        career: String,
    },

    /// Correlativities graph of a career
    Graph {
        #[arg(long)]
        student: String,
        #[arg(long)]
        career: String,
    },

    /// Check whether a student may enroll in a subject
    CanEnroll {
        #[arg(long)]
        student: String,
        #[arg(long)]
        subject: String,
    },

    /// Prerequisites of a subject the student has not completed
    Missing {
        #[arg(long)]
        student: String,
        #[arg(long)]
        subject: String,
    },

    /// Create an enrollment record (prerequisites are not re-checked)
    Enroll {
        #[arg(long)]
        student: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "active")]
        status: String,
    },

    /// Enroll in several subjects at once
    BulkEnroll {
        #[arg(long)]
        student: String,
        /// Comma-separated subject ids
        #[arg(long, value_delimiter = ',', required = true)]
        subjects: Vec<String>,
    },

    /// Overwrite the status of an enrollment record
    SetStatus {
        #[arg(long)]
        enrollment: String,
        #[arg(long)]
        status: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    match run(cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {:#}", i18n::t("common.error"), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let db_path = get_default_db_path(cli.db.as_deref());
    let state = AppState::new(&db_path)
        .await
        .map_err(anyhow::Error::msg)?;

    let locale = match cli.locale {
        Some(locale) => locale,
        None => state.configured_locale().await,
    };
    if !i18n::SUPPORTED_LOCALES.contains(&locale.as_str()) {
        tracing::warn!(locale = %locale, "unsupported locale, messages fall back to es");
    }
    i18n::set_locale(&locale);

    let api = state.enrollment_api.as_ref();

    let output = match cli.command {
        Command::InitDb => json!({
            "db_path": state.db_path.display().to_string(),
            "message": i18n::t("common.success"),
        }),

        Command::Import { dir } => {
            if !dir.is_dir() {
                anyhow::bail!(i18n::t_with_args(
                    "import.file_not_found",
                    &[("path", &dir.display().to_string())]
                ));
            }
            let summaries = state
                .importer
                .import_dir(&dir)
                .await
                .with_context(|| format!("import from {}", dir.display()))?;
            for summary in &summaries {
                eprintln!(
                    "{}",
                    i18n::t_with_args(
                        "import.file_summary",
                        &[
                            ("file", &summary.file),
                            ("read", &summary.rows_read.to_string()),
                            ("inserted", &summary.inserted.to_string()),
                            ("rejected", &summary.rejected.len().to_string()),
                        ]
                    )
                );
            }
            serde_json::to_value(summaries)?
        }

        Command::Eligibility { student, career } => {
            let map = api
                .get_eligibility_for_student(&StudentId::new(student), &CareerId::new(career))
                .await?;
            let subjects = map
                .values()
                .map(|entry| {
                    let mut value = serde_json::to_value(entry)?;
                    value["status_label"] = json!(i18n::status_label(entry.status));
                    Ok(value)
                })
                .collect::<Result<Vec<Value>, serde_json::Error>>()?;
            json!({ "subjects": subjects })
        }

        Command::Graph { student, career } => {
            let graph = api
                .get_graph_for_student(&StudentId::new(student), &CareerId::new(career))
                .await?;
            serde_json::to_value(graph)?
        }

        Command::CanEnroll { student, subject } => {
            let decision = api
                .check_enrollment(&StudentId::new(student), &SubjectId::new(subject))
                .await?;
            let message = match &decision {
                EnrollmentDecision::Allowed => i18n::t("common.success"),
                EnrollmentDecision::Rejected(reason) => i18n::rejection_message(reason),
            };
            json!({
                "allowed": decision.is_allowed(),
                "decision": decision,
                "message": message,
            })
        }

        Command::Missing { student, subject } => {
            let missing = api
                .get_missing_prerequisites(&StudentId::new(student), &SubjectId::new(subject))
                .await?;
            serde_json::to_value(missing)?
        }

        Command::Enroll {
            student,
            subject,
            status,
        } => {
            let status: EnrollmentStatus = status.parse()?;
            let enrollment = api
                .enroll(&StudentId::new(student), &SubjectId::new(subject), status)
                .await?;
            serde_json::to_value(enrollment)?
        }

        Command::BulkEnroll { student, subjects } => {
            let subject_ids: Vec<SubjectId> = subjects
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(SubjectId::new)
                .collect();
            let result = api
                .bulk_enroll(&StudentId::new(student), &subject_ids)
                .await?;
            json!({
                "summary": EnrollmentApi::bulk_enroll_summary(&result),
                "result": result,
            })
        }

        Command::SetStatus { enrollment, status } => {
            let status: EnrollmentStatus = status.parse()?;
            let enrollment = api
                .change_status(&EnrollmentId::new(enrollment), status)
                .await?;
            serde_json::to_value(enrollment)?
        }
    };

    Ok(output)
}
