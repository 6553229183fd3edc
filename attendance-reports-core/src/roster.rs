//! Student and attendance operations over the data store, plus dashboard tallies.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::contract::{DataStore, ReportLedger};
use crate::error::ReportError;
use crate::model::{
    AttendanceQuery, AttendanceRecord, CheckIn, CourseYear, DateRange, NewAttendanceRecord,
    NewStudent, Student, StudentUpdate,
};
use crate::summary::AttendanceSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub students_by_course_year: BTreeMap<CourseYear, usize>,
    pub total_reports: usize,
    /// Overall attendance rate across every record; 0 without records.
    pub attendance_rate: u32,
}

#[derive(Clone)]
pub struct Roster {
    data: Arc<dyn DataStore>,
    ledger: Arc<dyn ReportLedger>,
}

impl Roster {
    pub fn new(data: Arc<dyn DataStore>, ledger: Arc<dyn ReportLedger>) -> Self {
        Self { data, ledger }
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, ReportError> {
        self.data
            .list_students()
            .await
            .map_err(ReportError::upstream("list students"))
    }

    pub async fn recent_students(&self, limit: usize) -> Result<Vec<Student>, ReportError> {
        self.data
            .recent_students(limit)
            .await
            .map_err(ReportError::upstream("list recent students"))
    }

    pub async fn get_student(&self, id: &str) -> Result<Student, ReportError> {
        self.data
            .get_student(id)
            .await
            .map_err(ReportError::upstream("fetch student"))?
            .ok_or_else(|| ReportError::student_not_found(id))
    }

    pub async fn add_student(&self, student: NewStudent) -> Result<Student, ReportError> {
        if student.name.trim().is_empty() {
            return Err(ReportError::Validation("student name must not be blank".into()));
        }
        let created = self
            .data
            .add_student(student)
            .await
            .map_err(ReportError::upstream("add student"))?;
        info!(student_id = %created.id, course_year = %created.course_year, "Added student");
        Ok(created)
    }

    pub async fn update_student(
        &self,
        id: &str,
        update: StudentUpdate,
    ) -> Result<Student, ReportError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ReportError::Validation("student name must not be blank".into()));
        }
        if update.is_empty() {
            warn!(student_id = id, "Update carries no fields; only the timestamp changes");
        }
        let updated = self
            .data
            .update_student(id, update)
            .await
            .map_err(ReportError::upstream("update student"))?
            .ok_or_else(|| ReportError::student_not_found(id))?;
        info!(student_id = id, "Updated student");
        Ok(updated)
    }

    /// Delete a student together with its attendance. Returns the number of
    /// attendance records removed.
    pub async fn delete_student(&self, id: &str) -> Result<usize, ReportError> {
        let removed = self
            .data
            .delete_student(id)
            .await
            .map_err(ReportError::upstream("delete student"))?
            .ok_or_else(|| ReportError::student_not_found(id))?;
        info!(student_id = id, attendance_removed = removed, "Deleted student");
        Ok(removed)
    }

    /// Record attendance for an existing student.
    pub async fn check_in(&self, check_in: CheckIn) -> Result<AttendanceRecord, ReportError> {
        let student = self.get_student(&check_in.student_id).await?;
        let record = self
            .data
            .add_attendance(NewAttendanceRecord {
                student_id: student.id,
                student_name: student.name,
                course_year: student.course_year,
                date: check_in.date,
                status: check_in.status,
                notes: check_in.notes.filter(|n| !n.trim().is_empty()),
            })
            .await
            .map_err(ReportError::upstream("add attendance"))?;
        info!(
            record_id = %record.id,
            student_id = %record.student_id,
            date = %record.date,
            status = %record.status,
            "Recorded attendance"
        );
        Ok(record)
    }

    /// Attendance for one calendar day and/or course-year, newest first.
    pub async fn list_attendance(
        &self,
        date: Option<NaiveDate>,
        course_year: Option<CourseYear>,
    ) -> Result<Vec<AttendanceRecord>, ReportError> {
        self.data
            .query_attendance(AttendanceQuery {
                student_id: None,
                course_year,
                range: date.map(DateRange::day),
            })
            .await
            .map_err(ReportError::upstream("list attendance"))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ReportError> {
        let (students, records, reports) = futures::try_join!(
            async {
                self.data
                    .list_students()
                    .await
                    .map_err(ReportError::upstream("list students"))
            },
            async {
                self.data
                    .query_attendance(AttendanceQuery::default())
                    .await
                    .map_err(ReportError::upstream("list attendance"))
            },
            async {
                self.ledger
                    .list_reports()
                    .await
                    .map_err(ReportError::upstream("list reports"))
            },
        )?;

        let mut by_course: BTreeMap<CourseYear, usize> =
            CourseYear::ALL.into_iter().map(|cy| (cy, 0)).collect();
        for student in &students {
            *by_course.entry(student.course_year).or_default() += 1;
        }

        Ok(DashboardStats {
            total_students: students.len(),
            students_by_course_year: by_course,
            total_reports: reports.len(),
            attendance_rate: AttendanceSummary::from_records(&records).rate,
        })
    }
}
