//! # DocumentStore: JSON-file document database
//!
//! Implements both [`DataStore`] and [`ReportLedger`] over three collections,
//! each persisted as a JSON array in its own file under a data directory:
//!
//! - `students.json`
//! - `attendance.json`
//! - `reports.json`
//!
//! The whole state lives in memory behind a `tokio::sync::Mutex`. A mutation
//! edits a copy of the affected collection, writes that copy to disk (temporary
//! file, then rename) and only then swaps it in, so a failed write leaves both
//! memory and disk unchanged. [`DocumentStore::in_memory`] skips persistence.
//!
//! Ids are UUID v4 strings; `created_at`/`updated_at` are assigned here, never by callers.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use attendance_reports_core::contract::{DataStore, ReportLedger, StoreError};
use attendance_reports_core::model::{
    AttendanceQuery, AttendanceRecord, NewAttendanceRecord, NewReport, NewStudent, Report,
    Student, StudentUpdate,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const STUDENTS_FILE: &str = "students.json";
pub const ATTENDANCE_FILE: &str = "attendance.json";
pub const REPORTS_FILE: &str = "reports.json";

#[derive(Debug, Default)]
struct Collections {
    students: Vec<Student>,
    attendance: Vec<AttendanceRecord>,
    reports: Vec<Report>,
}

pub struct DocumentStore {
    dir: Option<PathBuf>,
    state: Mutex<Collections>,
}

impl DocumentStore {
    /// Open (or create) a file-backed store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!(error = ?e, dir = %dir.display(), "Failed to create data directory");
            e
        })?;

        let state = Collections {
            students: read_collection(&dir.join(STUDENTS_FILE)).await?,
            attendance: read_collection(&dir.join(ATTENDANCE_FILE)).await?,
            reports: read_collection(&dir.join(REPORTS_FILE)).await?,
        };
        info!(
            dir = %dir.display(),
            students = state.students.len(),
            attendance = state.attendance.len(),
            reports = state.reports.len(),
            "Opened document store"
        );
        Ok(Self {
            dir: Some(dir),
            state: Mutex::new(state),
        })
    }

    /// Store that keeps everything in process memory.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            state: Mutex::new(Collections::default()),
        }
    }

    async fn persist<T: Serialize>(&self, file: &str, docs: &[T]) -> Result<(), StoreError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(file);
        let tmp = dir.join(format!(".{file}.tmp"));
        let body = serde_json::to_vec_pretty(docs)?;
        tokio::fs::write(&tmp, body).await.map_err(|e| {
            error!(error = ?e, path = %tmp.display(), "Failed to write collection");
            e
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to replace collection file");
            e
        })?;
        debug!(path = %path.display(), documents = docs.len(), "Persisted collection");
        Ok(())
    }

    /// Persist `staged`, then make it the live collection.
    async fn commit<T: Serialize>(
        &self,
        file: &str,
        live: &mut Vec<T>,
        staged: Vec<T>,
    ) -> Result<(), StoreError> {
        self.persist(file, &staged).await?;
        *live = staged;
        Ok(())
    }
}

async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Collection file is not valid JSON");
            format!("invalid collection file {}: {e}", path.display()).into()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => {
            error!(error = ?e, path = %path.display(), "Failed to read collection file");
            Err(e.into())
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Newest date first; records of the same day keep newest insertion first.
fn sort_attendance(records: &mut [AttendanceRecord]) {
    records.sort_by_key(|r| Reverse((r.date, r.created_at)));
}

#[async_trait]
impl DataStore for DocumentStore {
    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let state = self.state.lock().await;
        let mut students = state.students.clone();
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn recent_students(&self, limit: usize) -> Result<Vec<Student>, StoreError> {
        let state = self.state.lock().await;
        let mut students = state.students.clone();
        students.sort_by_key(|s| Reverse(s.created_at));
        students.truncate(limit);
        Ok(students)
    }

    async fn get_student(&self, id: &str) -> Result<Option<Student>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.students.iter().find(|s| s.id == id).cloned())
    }

    async fn add_student(&self, student: NewStudent) -> Result<Student, StoreError> {
        let mut state = self.state.lock().await;
        let created = student.into_student(new_id(), Utc::now());
        let mut staged = state.students.clone();
        staged.push(created.clone());
        self.commit(STUDENTS_FILE, &mut state.students, staged).await?;
        debug!(student_id = %created.id, "Inserted student document");
        Ok(created)
    }

    async fn update_student(
        &self,
        id: &str,
        update: StudentUpdate,
    ) -> Result<Option<Student>, StoreError> {
        let mut state = self.state.lock().await;
        let mut staged = state.students.clone();
        let Some(student) = staged.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        update.apply(student, Utc::now());
        let updated = student.clone();
        self.commit(STUDENTS_FILE, &mut state.students, staged).await?;
        Ok(Some(updated))
    }

    async fn delete_student(&self, id: &str) -> Result<Option<usize>, StoreError> {
        let mut state = self.state.lock().await;
        if !state.students.iter().any(|s| s.id == id) {
            return Ok(None);
        }
        let students: Vec<Student> =
            state.students.iter().filter(|s| s.id != id).cloned().collect();
        let attendance: Vec<AttendanceRecord> = state
            .attendance
            .iter()
            .filter(|r| r.student_id != id)
            .cloned()
            .collect();
        let removed = state.attendance.len() - attendance.len();

        // Attendance first: a crash in between leaves the student without
        // history rather than orphaned records.
        self.persist(ATTENDANCE_FILE, &attendance).await?;
        if let Err(e) = self.persist(STUDENTS_FILE, &students).await {
            if let Err(restore) = self.persist(ATTENDANCE_FILE, &state.attendance).await {
                error!(error = ?restore, student_id = id, "Failed to restore attendance file");
            }
            return Err(e);
        }
        state.students = students;
        state.attendance = attendance;
        debug!(student_id = id, attendance_removed = removed, "Deleted student document");
        Ok(Some(removed))
    }

    async fn student_attendance(
        &self,
        student_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.query_attendance(AttendanceQuery {
            student_id: Some(student_id.to_string()),
            ..AttendanceQuery::default()
        })
        .await
    }

    async fn query_attendance(
        &self,
        query: AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<AttendanceRecord> = state
            .attendance
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        sort_attendance(&mut records);
        Ok(records)
    }

    async fn add_attendance(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut state = self.state.lock().await;
        let created = record.into_record(new_id(), Utc::now());
        let mut staged = state.attendance.clone();
        staged.push(created.clone());
        self.commit(ATTENDANCE_FILE, &mut state.attendance, staged).await?;
        Ok(created)
    }
}

#[async_trait]
impl ReportLedger for DocumentStore {
    async fn append(&self, report: NewReport) -> Result<Report, StoreError> {
        let mut state = self.state.lock().await;
        let created = report.into_report(new_id(), Utc::now());
        let mut staged = state.reports.clone();
        staged.push(created.clone());
        self.commit(REPORTS_FILE, &mut state.reports, staged).await?;
        debug!(report_id = %created.id, url = %created.url, "Appended ledger entry");
        Ok(created)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        let state = self.state.lock().await;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut reports: Vec<Report> = state.reports.iter().rev().cloned().collect();
        reports.sort_by_key(|r| Reverse(r.created_at));
        Ok(reports)
    }
}
