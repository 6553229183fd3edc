//! Report pipeline: fetch → compose document → upload → ledger → URL.
//!
//! [`ReportComposer`] owns explicitly constructed collaborator clients (no process
//! globals) and exposes two entrypoints:
//!   - [`ReportComposer::compose_student_report`]: one student's PDF report
//!   - [`ReportComposer::generate_report`]: course-year scoped reports in any format
//!
//! # Responsibilities
//! - Fail-fast orchestration: the first failing step aborts the rest and the
//!   error is returned unchanged in kind.
//! - The ledger entry and the uploaded artifact exist together or not at all: a
//!   failed ledger write deletes the artifact before the error is returned.
//! - Every call creates a new, uniquely named artifact and a new ledger row.
//!   There is no deduplication.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::contract::{ArtifactStore, DataStore, ReportLedger};
use crate::documents;
use crate::error::ReportError;
use crate::model::{
    AttendanceQuery, CourseYear, DateRange, NewReport, Report, ReportFormat, ReportType, Student,
};
use crate::render::{render, ReportDocument};
use crate::summary::AttendanceSummary;

/// Input for [`ReportComposer::generate_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub course_year: Option<CourseYear>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub format: ReportFormat,
}

impl ReportRequest {
    /// Check scope inputs and resolve the date range.
    fn validate(&self) -> Result<(CourseYear, Option<DateRange>), ReportError> {
        if self.report_type == ReportType::StudentReport {
            return Err(ReportError::Validation(
                "single-student reports are generated per student id".into(),
            ));
        }
        let course_year = self
            .course_year
            .ok_or_else(|| ReportError::Validation("a course year is required".into()))?;

        let range = match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                return Err(ReportError::Validation(format!(
                    "date range starts after it ends ({from} > {to})"
                )))
            }
            (Some(from), Some(to)) => Some(DateRange { from, to }),
            (None, None) => None,
            _ => {
                return Err(ReportError::Validation(
                    "a date range needs both a start and an end date".into(),
                ))
            }
        };
        if range.is_none() && self.report_type != ReportType::Student {
            return Err(ReportError::Validation(format!(
                "a date range is required for {} reports",
                self.report_type
            )));
        }
        Ok((course_year, range))
    }
}

#[derive(Clone)]
pub struct ReportComposer {
    data: Arc<dyn DataStore>,
    artifacts: Arc<dyn ArtifactStore>,
    ledger: Arc<dyn ReportLedger>,
}

impl ReportComposer {
    pub fn new(
        data: Arc<dyn DataStore>,
        artifacts: Arc<dyn ArtifactStore>,
        ledger: Arc<dyn ReportLedger>,
    ) -> Self {
        Self {
            data,
            artifacts,
            ledger,
        }
    }

    /// Render, upload and register a PDF report for one student. Returns the artifact URL.
    pub async fn compose_student_report(&self, student_id: &str) -> Result<String, ReportError> {
        info!(student_id, "[REPORT] Composing student report");

        let student = self
            .data
            .get_student(student_id)
            .await
            .map_err(ReportError::upstream("fetch student"))?
            .ok_or_else(|| {
                error!(student_id, "[REPORT][ERROR] Student not found");
                ReportError::student_not_found(student_id)
            })?;

        let records = self
            .data
            .student_attendance(student_id)
            .await
            .map_err(ReportError::upstream("fetch attendance"))?;

        let summary = AttendanceSummary::from_records(&records);
        info!(
            student_id,
            total = summary.total,
            present = summary.present,
            absent = summary.absent,
            rate = summary.rate,
            "[REPORT] Computed attendance summary"
        );

        let document = documents::student_report(&student, &records, &summary);
        let name = artifact_name(&format!("student_{}", student.id), ReportFormat::Pdf);
        let entry = NewReport {
            report_type: ReportType::StudentReport,
            student_id: Some(student.id.clone()),
            student_name: Some(student.name.clone()),
            course_year: Some(student.course_year),
            date_range: None,
            format: ReportFormat::Pdf,
            url: String::new(),
        };

        let report = self.publish(&document, &name, entry).await?;
        info!(student_id, url = %report.url, "[REPORT] Student report ready");
        Ok(report.url)
    }

    /// Render, upload and register a course-year scoped report.
    pub async fn generate_report(&self, request: ReportRequest) -> Result<Report, ReportError> {
        let (course_year, range) = request.validate().map_err(|e| {
            warn!(?request, error = %e, "[REPORT] Rejected report request");
            e
        })?;
        info!(
            report_type = %request.report_type,
            %course_year,
            format = %request.format,
            "[REPORT] Generating report"
        );

        let records = self
            .data
            .query_attendance(AttendanceQuery {
                student_id: None,
                course_year: Some(course_year),
                range,
            })
            .await
            .map_err(ReportError::upstream("fetch attendance"))?;
        debug!(records = records.len(), "[REPORT] Fetched attendance for scope");

        let document = match (request.report_type, range) {
            (ReportType::Attendance, Some(range)) => {
                documents::attendance_report(course_year, range, &records)
            }
            (ReportType::Performance, Some(range)) => {
                let students = self.cohort(course_year).await?;
                documents::performance_report(course_year, range, &students, &records)
            }
            _ => {
                let students = self.cohort(course_year).await?;
                documents::cohort_student_report(course_year, range, &students, &records)
            }
        };

        let name = artifact_name(
            &format!("{}_{}", request.report_type, course_year.slug()),
            request.format,
        );
        let entry = NewReport {
            report_type: request.report_type,
            student_id: None,
            student_name: None,
            course_year: Some(course_year),
            date_range: range,
            format: request.format,
            url: String::new(),
        };
        self.publish(&document, &name, entry).await
    }

    /// Ledger entries, newest first.
    pub async fn saved_reports(&self) -> Result<Vec<Report>, ReportError> {
        self.ledger
            .list_reports()
            .await
            .map_err(ReportError::upstream("list reports"))
    }

    async fn cohort(&self, course_year: CourseYear) -> Result<Vec<Student>, ReportError> {
        let students = self
            .data
            .list_students()
            .await
            .map_err(ReportError::upstream("list students"))?;
        Ok(students
            .into_iter()
            .filter(|s| s.course_year == course_year)
            .collect())
    }

    /// Serialize, upload, resolve the URL and append the ledger entry.
    ///
    /// If the ledger write fails the uploaded object is deleted again.
    async fn publish(
        &self,
        document: &ReportDocument,
        name: &str,
        mut entry: NewReport,
    ) -> Result<Report, ReportError> {
        let format = entry.format;
        let bytes = render(document, format)?;

        info!(artifact = name, size = bytes.len(), "[REPORT][UPLOAD] Uploading artifact");
        self.artifacts
            .upload(name, bytes, format.content_type())
            .await
            .map_err(|e| {
                error!(artifact = name, error = %e, "[REPORT][ERROR][UPLOAD] Upload failed");
                ReportError::Upstream {
                    operation: "upload artifact",
                    source: e,
                }
            })?;

        let url = match self.artifacts.public_url(name).await {
            Ok(url) => url,
            Err(e) => {
                error!(
                    artifact = name,
                    error = %e,
                    "[REPORT][ERROR][UPLOAD] Could not resolve public URL"
                );
                self.discard(name).await;
                return Err(ReportError::Upstream {
                    operation: "resolve artifact url",
                    source: e,
                });
            }
        };
        entry.url = url;

        match self.ledger.append(entry).await {
            Ok(report) => {
                info!(
                    report_id = %report.id,
                    url = %report.url,
                    "[REPORT][LEDGER] Ledger entry appended"
                );
                Ok(report)
            }
            Err(e) => {
                error!(artifact = name, error = %e, "[REPORT][ERROR][LEDGER] Ledger append failed");
                self.discard(name).await;
                Err(ReportError::Upstream {
                    operation: "append ledger entry",
                    source: e,
                })
            }
        }
    }

    /// Compensation for a publish that did not reach the ledger.
    async fn discard(&self, name: &str) {
        match self.artifacts.delete(name).await {
            Ok(()) => info!(artifact = name, "[REPORT][UPLOAD] Removed orphaned artifact"),
            Err(e) => error!(
                artifact = name,
                error = %e,
                "[REPORT][ERROR][UPLOAD] Failed to remove orphaned artifact"
            ),
        }
    }
}

/// `{prefix}_report_{unix-nanos}_{8 hex}.{ext}`: unique per call even within the same instant.
pub fn artifact_name(prefix: &str, format: ReportFormat) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_report_{}_{}.{}",
        sanitize(prefix),
        nanos,
        &suffix[..8],
        format.extension()
    )
}

fn sanitize(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(report_type: ReportType) -> ReportRequest {
        ReportRequest {
            report_type,
            course_year: Some(CourseYear::Bca1),
            from: None,
            to: None,
            format: ReportFormat::Csv,
        }
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, d)
    }

    #[test]
    fn artifact_names_are_unique_and_safe() {
        let a = artifact_name("student_abc/../x", ReportFormat::Pdf);
        let b = artifact_name("student_abc/../x", ReportFormat::Pdf);
        assert_ne!(a, b);
        assert!(a.starts_with("student_abc----x_report_"));
        assert!(a.ends_with(".pdf"));
        assert!(!a.contains('/'));
    }

    #[test]
    fn course_year_is_always_required() {
        let req = ReportRequest {
            course_year: None,
            ..request(ReportType::Student)
        };
        assert!(req.validate().unwrap_err().is_validation());
    }

    #[test]
    fn student_scope_does_not_need_a_range() {
        assert_eq!(request(ReportType::Student).validate().unwrap(), (CourseYear::Bca1, None));
    }

    #[test]
    fn attendance_and_performance_need_a_range() {
        for t in [ReportType::Attendance, ReportType::Performance] {
            assert!(request(t).validate().unwrap_err().is_validation(), "{t}");
        }
    }

    #[test]
    fn half_open_or_inverted_ranges_are_rejected() {
        let half = ReportRequest {
            from: day(1),
            ..request(ReportType::Student)
        };
        assert!(half.validate().unwrap_err().is_validation());

        let inverted = ReportRequest {
            from: day(9),
            to: day(1),
            ..request(ReportType::Attendance)
        };
        assert!(inverted.validate().unwrap_err().is_validation());
    }
}
