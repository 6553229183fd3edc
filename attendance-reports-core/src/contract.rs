//! # contract: the three collaborators the report pipeline talks to
//!
//! - [`DataStore`]: source of truth for students and attendance records.
//! - [`ArtifactStore`]: binary object storage that hands out public URLs.
//! - [`ReportLedger`]: append-only log of generated reports.
//!
//! All methods are async and return boxed `Send + Sync` errors ([`StoreError`]);
//! callers in this crate map them into [`crate::error::ReportError`].
//!
//! ## Mocking & Testing
//! Every trait is annotated for `mockall`. The generated `MockDataStore`,
//! `MockArtifactStore` and `MockReportLedger` are exported behind the default
//! `test-export-mocks` feature so integration tests in dependent crates can use them.

use async_trait::async_trait;
use mockall::automock;

use crate::model::{
    AttendanceQuery, AttendanceRecord, NewAttendanceRecord, NewReport, NewStudent, Report,
    Student, StudentUpdate,
};

/// Error type returned by every collaborator call.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Document store holding the `students` and `attendance` collections.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All students ordered by name.
    async fn list_students(&self) -> Result<Vec<Student>, StoreError>;

    /// Most recently created students first, at most `limit`.
    async fn recent_students(&self, limit: usize) -> Result<Vec<Student>, StoreError>;

    async fn get_student(&self, id: &str) -> Result<Option<Student>, StoreError>;

    /// Insert a student; the store assigns id, `created_at` and `updated_at`.
    async fn add_student(&self, student: NewStudent) -> Result<Student, StoreError>;

    /// Apply a partial update. Returns `None` when no student has this id.
    async fn update_student(
        &self,
        id: &str,
        update: StudentUpdate,
    ) -> Result<Option<Student>, StoreError>;

    /// Delete a student and every attendance record referencing it.
    ///
    /// Returns the number of attendance records removed, or `None` when no
    /// student has this id (in which case nothing is touched).
    async fn delete_student(&self, id: &str) -> Result<Option<usize>, StoreError>;

    /// All attendance for one student, date descending.
    async fn student_attendance(
        &self,
        student_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Filtered attendance listing, date descending.
    async fn query_attendance(
        &self,
        query: AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Insert an attendance record; the store assigns id and `created_at`.
    async fn add_attendance(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError>;
}

/// Object storage for rendered report bytes.
///
/// Object names are chosen by the caller and must be unique; implementations
/// must refuse to overwrite an existing object.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Durable, publicly resolvable URL of an uploaded object.
    async fn public_url(&self, name: &str) -> Result<String, StoreError>;

    /// Remove an object. Used to compensate a failed ledger write.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Append-only report metadata log.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReportLedger: Send + Sync {
    /// Append an entry; the ledger assigns id and `created_at`.
    async fn append(&self, report: NewReport) -> Result<Report, StoreError>;

    /// All entries, newest first.
    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;
}
