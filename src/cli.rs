//! # attendance-reports CLI
//!
//! Command parsing, wiring of the concrete adapters, and printing of results.
//! Business rules (validation, report composition, statistics) live in
//! `attendance-reports-core`; this module only turns arguments into calls on
//! [`Roster`] and [`ReportComposer`].
//!
//! Records print to stdout as pretty JSON; `report student` prints the URL alone
//! so it can be piped. Logs go to stderr.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use attendance_reports_core::contract::ArtifactStore;
use attendance_reports_core::model::{
    AttendanceStatus, CheckIn, CourseYear, NewStudent, ReportFormat, ReportType, StudentUpdate,
};
use attendance_reports_core::{ReportComposer, ReportRequest, Roster};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::document_store::DocumentStore;
use crate::load_config::{load_config, AppConfig, StorageConfig};
use crate::storage::{LocalArtifactStore, SupabaseStorage};

/// CLI for attendance-reports: manage students and attendance, publish reports.
#[derive(Parser)]
#[clap(
    name = "attendance-reports",
    version,
    about = "Record student attendance and publish attendance reports"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add, list, inspect, update or delete students
    Student {
        #[clap(subcommand)]
        command: StudentCommand,
    },
    /// Record and list attendance
    Attendance {
        #[clap(subcommand)]
        command: AttendanceCommand,
    },
    /// Generate and list reports
    Report {
        #[clap(subcommand)]
        command: ReportCommand,
    },
    /// Print dashboard statistics
    Stats,
}

/// Optional contact and family fields shared by `student add` and `student update`.
#[derive(Args, Debug, Default)]
pub struct StudentFields {
    #[clap(long)]
    pub email: Option<String>,
    #[clap(long)]
    pub roll_number: Option<String>,
    #[clap(long)]
    pub phone: Option<String>,
    #[clap(long)]
    pub address: Option<String>,
    #[clap(long)]
    pub parent_name: Option<String>,
    #[clap(long)]
    pub parent_phone: Option<String>,
    #[clap(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum StudentCommand {
    Add {
        #[clap(long)]
        name: String,
        /// "BCA 1st Year", "bca-1st-year" or just 1/2/3
        #[clap(long)]
        course_year: CourseYear,
        #[clap(flatten)]
        fields: StudentFields,
    },
    List {
        /// Only the N most recently added students
        #[clap(long)]
        recent: Option<usize>,
    },
    Show {
        #[clap(long)]
        id: String,
    },
    Update {
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        course_year: Option<CourseYear>,
        #[clap(flatten)]
        fields: StudentFields,
    },
    /// Delete a student and all of its attendance records
    Delete {
        #[clap(long)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AttendanceCommand {
    CheckIn {
        #[clap(long)]
        student_id: String,
        /// present, absent, late or excused
        #[clap(long)]
        status: AttendanceStatus,
        /// Defaults to today
        #[clap(long)]
        date: Option<NaiveDate>,
        #[clap(long)]
        notes: Option<String>,
    },
    List {
        #[clap(long)]
        date: Option<NaiveDate>,
        #[clap(long)]
        course_year: Option<CourseYear>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Generate the PDF report for one student and print its URL
    Student {
        #[clap(long)]
        id: String,
    },
    /// Generate a course-year report
    Generate {
        /// student, attendance or performance
        #[clap(long = "type")]
        report_type: ReportType,
        #[clap(long)]
        course_year: Option<CourseYear>,
        #[clap(long)]
        from: Option<NaiveDate>,
        #[clap(long)]
        to: Option<NaiveDate>,
        /// pdf, excel or csv
        #[clap(long, default_value_t = ReportFormat::Pdf)]
        format: ReportFormat,
    },
    /// List every generated report, newest first
    List,
}

/// Services wired to the adapters selected by the config.
pub struct App {
    pub roster: Roster,
    pub composer: ReportComposer,
}

impl App {
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(
            DocumentStore::open(&config.data_dir)
                .await
                .map_err(|e| anyhow!(e))
                .with_context(|| {
                    format!("Failed to open data directory {}", config.data_dir.display())
                })?,
        );
        let artifacts: Arc<dyn ArtifactStore> = match &config.storage {
            StorageConfig::Local {
                dir,
                public_base_url,
            } => Arc::new(LocalArtifactStore::new(dir, public_base_url.clone())),
            StorageConfig::Supabase(supabase) => Arc::new(SupabaseStorage::new(supabase.clone())),
        };
        tracing::info!(storage = config.storage.kind(), "Wired report services");

        Ok(Self {
            roster: Roster::new(store.clone(), store.clone()),
            composer: ReportComposer::new(store.clone(), artifacts, store),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_student(name: String, course_year: CourseYear, fields: StudentFields) -> NewStudent {
    NewStudent {
        email: fields.email,
        roll_number: fields.roll_number,
        phone: fields.phone,
        address: fields.address,
        parent_name: fields.parent_name,
        parent_phone: fields.parent_phone,
        notes: fields.notes,
        ..NewStudent::new(name, course_year)
    }
}

fn student_update(
    name: Option<String>,
    course_year: Option<CourseYear>,
    fields: StudentFields,
) -> StudentUpdate {
    StudentUpdate {
        name,
        course_year,
        email: fields.email,
        roll_number: fields.roll_number,
        phone: fields.phone,
        address: fields.address,
        parent_name: fields.parent_name,
        parent_phone: fields.parent_phone,
        notes: fields.notes,
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!(config = %cli.config.display(), "trace_initialised");
    let config = load_config(&cli.config)?;
    let app = App::from_config(&config).await?;

    match cli.command {
        Commands::Student { command } => run_student(&app, command).await,
        Commands::Attendance { command } => run_attendance(&app, command).await,
        Commands::Report { command } => run_report(&app, command).await,
        Commands::Stats => {
            let stats = app
                .roster
                .dashboard_stats()
                .await
                .context("Failed to compute dashboard statistics")?;
            print_json(&stats)
        }
    }
}

async fn run_student(app: &App, command: StudentCommand) -> Result<()> {
    match command {
        StudentCommand::Add {
            name,
            course_year,
            fields,
        } => {
            let student = app
                .roster
                .add_student(new_student(name, course_year, fields))
                .await
                .context("Failed to add student")?;
            print_json(&student)
        }
        StudentCommand::List { recent } => {
            let students = match recent {
                Some(limit) => app.roster.recent_students(limit).await,
                None => app.roster.list_students().await,
            }
            .context("Failed to list students")?;
            print_json(&students)
        }
        StudentCommand::Show { id } => {
            let student = app.roster.get_student(&id).await?;
            print_json(&student)
        }
        StudentCommand::Update {
            id,
            name,
            course_year,
            fields,
        } => {
            let student = app
                .roster
                .update_student(&id, student_update(name, course_year, fields))
                .await
                .with_context(|| format!("Failed to update student {id}"))?;
            print_json(&student)
        }
        StudentCommand::Delete { id } => {
            let removed = app
                .roster
                .delete_student(&id)
                .await
                .with_context(|| format!("Failed to delete student {id}"))?;
            print_json(&serde_json::json!({
                "deleted": id,
                "attendanceRemoved": removed,
            }))
        }
    }
}

async fn run_attendance(app: &App, command: AttendanceCommand) -> Result<()> {
    match command {
        AttendanceCommand::CheckIn {
            student_id,
            status,
            date,
            notes,
        } => {
            let record = app
                .roster
                .check_in(CheckIn {
                    student_id,
                    date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
                    status,
                    notes,
                })
                .await
                .context("Failed to record attendance")?;
            print_json(&record)
        }
        AttendanceCommand::List { date, course_year } => {
            let records = app
                .roster
                .list_attendance(date, course_year)
                .await
                .context("Failed to list attendance")?;
            print_json(&records)
        }
    }
}

async fn run_report(app: &App, command: ReportCommand) -> Result<()> {
    match command {
        ReportCommand::Student { id } => {
            let url = app
                .composer
                .compose_student_report(&id)
                .await
                .with_context(|| format!("Failed to generate report for student {id}"))?;
            println!("{url}");
            Ok(())
        }
        ReportCommand::Generate {
            report_type,
            course_year,
            from,
            to,
            format,
        } => {
            let report = app
                .composer
                .generate_report(ReportRequest {
                    report_type,
                    course_year,
                    from,
                    to,
                    format,
                })
                .await
                .with_context(|| format!("Failed to generate {report_type} report"))?;
            print_json(&report)
        }
        ReportCommand::List => {
            let reports = app
                .composer
                .saved_reports()
                .await
                .context("Failed to list reports")?;
            print_json(&reports)
        }
    }
}
