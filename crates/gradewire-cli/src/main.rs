//! Gradewire operator CLI
//!
//! The `gradewire` command drives the grading service against the
//! configured store (SURREALDB_URL, or local persistence under
//! `.gradewire/db`).
//!
//! ## Commands
//!
//! - `homework-id`: resolve a course key + homework number to its id
//! - `update-metadata`: set a homework's deadline and score policy
//! - `update-tests`: replace a homework's test suite from a JSON file
//! - `add-course`: register a new course secret key
//! - `submit`: grade an answer for a student
//! - `grades`: per-student or whole-course grade report

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing::Level;

use gradewire_core::codec;
use gradewire_engine::dispatch::{MetadataPayload, NewCoursePayload, SuitePayload};
use gradewire_engine::{ApiRequest, ApiResponse, GraderService, ModuleRegistry};
use oxidized_gradebook::SurrealGradeStore;

#[derive(Parser)]
#[command(name = "gradewire")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Remote homework grading service", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the homework id for a course key and assignment number
    HomeworkId {
        /// Course secret key
        #[arg(short, long, env = "GRADEWIRE_SECRET_KEY")]
        secret_key: String,

        /// Assignment number within the course
        #[arg(short = 'n', long)]
        homework_number: u32,
    },

    /// Create or overwrite a homework's metadata
    UpdateMetadata {
        #[arg(short, long, env = "GRADEWIRE_SECRET_KEY")]
        secret_key: String,

        #[arg(short = 'n', long)]
        homework_number: u32,

        /// Deadline, e.g. "2024-09-21 23:59"
        #[arg(short, long)]
        deadline: String,

        /// Total points the homework is worth
        #[arg(short, long)]
        total_score: f64,

        /// Advisory per-test-case daily submission cap
        #[arg(short, long, default_value = "10")]
        max_daily_submissions: i64,
    },

    /// Replace a homework's test suite from a JSON file
    ///
    /// The file holds `{ "test_cases": { <id>: { "module", "function",
    /// "params" } }, "libraries": { "packages", "imports", "functions" } }`.
    UpdateTests {
        #[arg(short, long, env = "GRADEWIRE_SECRET_KEY")]
        secret_key: String,

        #[arg(short = 'n', long)]
        homework_number: u32,

        /// Path to the suite definition
        #[arg(long)]
        suite: PathBuf,
    },

    /// Register a new course secret key
    AddCourse {
        /// An existing valid secret key
        #[arg(short, long, env = "GRADEWIRE_SECRET_KEY")]
        secret_key: String,

        /// New course id (e.g. CIS700_S25)
        #[arg(long)]
        course_id: String,

        /// Secret key for the new course
        #[arg(long)]
        new_secret: String,
    },

    /// Grade an answer for a student
    Submit {
        /// Homework id (e.g. CIS545_F24_HW1)
        #[arg(long)]
        homework_id: String,

        /// Student id (must not contain '_')
        #[arg(long)]
        student: String,

        /// Test case id within the homework
        #[arg(long)]
        test_case: String,

        /// Answer as a JSON value, e.g. '42' or '{"rows": 3}'
        #[arg(long)]
        answer: String,
    },

    /// Grade report for one student or the whole course
    Grades {
        #[arg(long)]
        homework_id: String,

        /// Report a single student (no key required)
        #[arg(long, conflicts_with = "secret_key")]
        student: Option<String>,

        /// Course key for the all-students report
        #[arg(short, long, env = "GRADEWIRE_SECRET_KEY")]
        secret_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let store = Arc::new(
        SurrealGradeStore::from_env()
            .await
            .context("Failed to open the gradewire store")?,
    );
    let service = GraderService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(ModuleRegistry::with_standard()),
    );

    let request = build_request(cli.command)?;
    let response = service.dispatch(request).await;
    print_response(response)
}

fn build_request(command: Commands) -> Result<ApiRequest> {
    Ok(match command {
        Commands::HomeworkId {
            secret_key,
            homework_number,
        } => ApiRequest::GetHomeworkId {
            homework_number,
            secret_key,
        },

        Commands::UpdateMetadata {
            secret_key,
            homework_number,
            deadline,
            total_score,
            max_daily_submissions,
        } => ApiRequest::UpdateMetadata {
            homework_number,
            secret_key,
            payload: codec::serialize(&MetadataPayload {
                deadline: parse_deadline(&deadline)?,
                total_score,
                max_daily_submissions,
            })?,
        },

        Commands::UpdateTests {
            secret_key,
            homework_number,
            suite,
        } => {
            let raw = std::fs::read_to_string(&suite)
                .with_context(|| format!("Failed to read suite file {}", suite.display()))?;
            let payload: SuitePayload = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid suite definition in {}", suite.display()))?;
            ApiRequest::UpdateTests {
                homework_number,
                secret_key,
                payload: codec::serialize(&payload)?,
            }
        }

        Commands::AddCourse {
            secret_key,
            course_id,
            new_secret,
        } => ApiRequest::AddCourse {
            secret_key,
            payload: codec::serialize(&NewCoursePayload {
                course_id,
                secret_key: new_secret,
            })?,
        },

        Commands::Submit {
            homework_id,
            student,
            test_case,
            answer,
        } => {
            let answer: serde_json::Value = serde_json::from_str(&answer)
                .context("Answer must be a JSON value, e.g. '42' or '\"text\"'")?;
            ApiRequest::Submit {
                homework_id,
                student_id: student,
                test_case_id: test_case,
                answer: codec::serialize(&answer)?,
            }
        }

        Commands::Grades {
            homework_id,
            student,
            secret_key,
        } => match (student, secret_key) {
            (Some(student_id), _) => ApiRequest::StudentGrade {
                homework_id,
                student_id,
            },
            (None, Some(secret_key)) => ApiRequest::AllStudentsGrades {
                homework_id,
                secret_key,
            },
            (None, None) => {
                anyhow::bail!("grades requires either --student or --secret-key")
            }
        },
    })
}

/// Accept the common instructor formats for deadlines.
fn parse_deadline(raw: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    anyhow::bail!("Unrecognized deadline '{raw}'; expected e.g. 2024-09-21 23:59")
}

fn print_response(response: ApiResponse) -> Result<()> {
    if response.is_success() {
        println!("{}", response.body);
        Ok(())
    } else {
        anyhow::bail!("{}", response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deadline_formats() {
        assert!(parse_deadline("2024-09-21 23:59").is_ok());
        assert!(parse_deadline("2024-09-21 23:59:30").is_ok());
        assert!(parse_deadline("2024-09-21T23:59:30").is_ok());
        assert!(parse_deadline("next friday").is_err());
    }

    #[test]
    fn test_grades_requires_scope() {
        let err = build_request(Commands::Grades {
            homework_id: "CIS545_F24_HW1".to_string(),
            student: None,
            secret_key: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("--student"));
    }

    #[test]
    fn test_submit_rejects_non_json_answer() {
        let err = build_request(Commands::Submit {
            homework_id: "CIS545_F24_HW1".to_string(),
            student: "alice".to_string(),
            test_case: "q1".to_string(),
            answer: "{not json".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("JSON value"));
    }
}
