//! Typed records exchanged with the data store, artifact store and report ledger.
//!
//! Field names serialize in camelCase so documents written by earlier versions of
//! the application (`courseYear`, `rollNumber`, `lastUpdated`, ...) load unchanged.
//! Closed categories are enums; an unknown label fails deserialization at the
//! store boundary instead of leaking an untyped string into the pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cohort a student belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CourseYear {
    #[serde(rename = "BCA 1st Year")]
    Bca1,
    #[serde(rename = "BCA 2nd Year")]
    Bca2,
    #[serde(rename = "BCA 3rd Year")]
    Bca3,
}

impl CourseYear {
    pub const ALL: [CourseYear; 3] = [CourseYear::Bca1, CourseYear::Bca2, CourseYear::Bca3];

    pub fn label(&self) -> &'static str {
        match self {
            CourseYear::Bca1 => "BCA 1st Year",
            CourseYear::Bca2 => "BCA 2nd Year",
            CourseYear::Bca3 => "BCA 3rd Year",
        }
    }

    /// Lowercase, dash separated form used in artifact names.
    pub fn slug(&self) -> &'static str {
        match self {
            CourseYear::Bca1 => "bca-1st-year",
            CourseYear::Bca2 => "bca-2nd-year",
            CourseYear::Bca3 => "bca-3rd-year",
        }
    }

    fn short(&self) -> &'static str {
        match self {
            CourseYear::Bca1 => "1",
            CourseYear::Bca2 => "2",
            CourseYear::Bca3 => "3",
        }
    }
}

impl fmt::Display for CourseYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CourseYear {
    type Err = String;

    /// Accepts the display label, the slug, or the short forms `1`/`2`/`3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        CourseYear::ALL
            .into_iter()
            .find(|cy| {
                normalized == cy.label().to_ascii_lowercase()
                    || normalized == cy.slug()
                    || normalized == cy.short()
            })
            .ok_or_else(|| {
                format!(
                    "unknown course year '{s}' (expected one of: {})",
                    CourseYear::ALL.map(|cy| cy.label()).join(", ")
                )
            })
    }
}

/// Outcome of a single check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            other => Err(format!(
                "unknown attendance status '{other}' (expected present, absent, late or excused)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub course_year: CourseYear,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastUpdated")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a student. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub course_year: CourseYear,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, course_year: CourseYear) -> Self {
        Self {
            name: name.into(),
            course_year,
            email: None,
            roll_number: None,
            phone: None,
            address: None,
            parent_name: None,
            parent_phone: None,
            notes: None,
        }
    }

    pub fn into_student(self, id: String, now: DateTime<Utc>) -> Student {
        Student {
            id,
            name: self.name,
            course_year: self.course_year,
            email: self.email,
            roll_number: self.roll_number,
            phone: self.phone,
            address: self.address,
            parent_name: self.parent_name,
            parent_phone: self.parent_phone,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub course_year: Option<CourseYear>,
    pub email: Option<String>,
    pub roll_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
}

impl StudentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == StudentUpdate::default()
    }

    pub fn apply(self, student: &mut Student, now: DateTime<Utc>) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn set_opt(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut student.name, self.name);
        set(&mut student.course_year, self.course_year);
        set_opt(&mut student.email, self.email);
        set_opt(&mut student.roll_number, self.roll_number);
        set_opt(&mut student.phone, self.phone);
        set_opt(&mut student.address, self.address);
        set_opt(&mut student.parent_name, self.parent_name);
        set_opt(&mut student.parent_phone, self.parent_phone);
        set_opt(&mut student.notes, self.notes);
        student.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub course_year: CourseYear,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A check-in as submitted by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Store payload for an attendance record; name and course-year are denormalized
/// from the student at check-in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub course_year: CourseYear,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewAttendanceRecord {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id: self.student_id,
            student_name: self.student_name,
            course_year: self.course_year,
            date: self.date,
            status: self.status,
            notes: self.notes,
            created_at: now,
        }
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", locale_date(self.from), locale_date(self.to))
    }
}

/// Filters for attendance listings. Results are always ordered by date descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceQuery {
    pub student_id: Option<String>,
    pub course_year: Option<CourseYear>,
    pub range: Option<DateRange>,
}

impl AttendanceQuery {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.student_id
            .as_deref()
            .map_or(true, |id| record.student_id == id)
            && self.course_year.map_or(true, |cy| record.course_year == cy)
            && self.range.map_or(true, |r| r.contains(record.date))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "attendance")]
    Attendance,
    #[serde(rename = "performance")]
    Performance,
    /// Single-student PDF produced by the composer.
    #[serde(rename = "student-report")]
    StudentReport,
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Student => "student",
            ReportType::Attendance => "attendance",
            ReportType::Performance => "performance",
            ReportType::StudentReport => "student-report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportType::Student | ReportType::StudentReport => "Student Report",
            ReportType::Attendance => "Attendance Report",
            ReportType::Performance => "Performance Report",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(ReportType::Student),
            "attendance" => Ok(ReportType::Attendance),
            "performance" => Ok(ReportType::Performance),
            "student-report" => Ok(ReportType::StudentReport),
            other => Err(format!(
                "unknown report type '{other}' (expected student, attendance or performance)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Excel,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "xls",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Excel => "application/vnd.ms-excel",
            ReportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "excel",
            ReportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "excel" | "xls" => Ok(ReportFormat::Excel),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format '{other}' (expected pdf, excel or csv)")),
        }
    }
}

/// Ledger entry for a generated report. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub course_year: Option<CourseYear>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    pub format: ReportFormat,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub course_year: Option<CourseYear>,
    pub date_range: Option<DateRange>,
    pub format: ReportFormat,
    pub url: String,
}

impl NewReport {
    pub fn into_report(self, id: String, now: DateTime<Utc>) -> Report {
        Report {
            id,
            report_type: self.report_type,
            student_id: self.student_id,
            student_name: self.student_name,
            course_year: self.course_year,
            date_range: self.date_range,
            format: self.format,
            url: self.url,
            created_at: now,
        }
    }
}

/// US-locale short date (`M/D/YYYY`), as shown in rendered reports.
pub fn locale_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_year_parses_label_slug_and_short_form() {
        for input in ["BCA 2nd Year", "bca-2nd-year", " 2 "] {
            assert_eq!(input.parse::<CourseYear>(), Ok(CourseYear::Bca2), "input: {input:?}");
        }
        assert!("BCA 4th Year".parse::<CourseYear>().is_err());
    }

    #[test]
    fn student_document_uses_original_field_names() {
        let json = r#"{
            "id": "s1",
            "name": "Asha",
            "courseYear": "BCA 1st Year",
            "rollNumber": "17",
            "parentName": null,
            "createdAt": "2024-03-01T10:00:00Z",
            "lastUpdated": "2024-03-02T10:00:00Z"
        }"#;
        let student: Student = serde_json::from_str(json).expect("student should deserialize");
        assert_eq!(student.course_year, CourseYear::Bca1);
        assert_eq!(student.roll_number.as_deref(), Some("17"));
        assert_eq!(student.parent_name, None);
        assert_eq!(student.email, None);
    }

    #[test]
    fn unknown_status_is_rejected_at_the_boundary() {
        let json = r#"{
            "id": "a1", "studentId": "s1", "studentName": "Asha",
            "courseYear": "BCA 1st Year", "date": "2024-03-01",
            "status": "sick", "createdAt": "2024-03-01T10:00:00Z"
        }"#;
        assert!(serde_json::from_str::<AttendanceRecord>(json).is_err());
    }

    #[test]
    fn report_type_serializes_with_ledger_labels() {
        let json = serde_json::to_string(&ReportType::StudentReport).unwrap();
        assert_eq!(json, "\"student-report\"");
    }

    #[test]
    fn update_keeps_fields_that_are_not_set() {
        let created = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let later = "2024-02-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut student = NewStudent {
            email: Some("asha@example.com".into()),
            ..NewStudent::new("Asha", CourseYear::Bca1)
        }
        .into_student("s1".into(), created);

        StudentUpdate {
            phone: Some("555-0100".into()),
            ..Default::default()
        }
        .apply(&mut student, later);

        assert_eq!(student.email.as_deref(), Some("asha@example.com"));
        assert_eq!(student.phone.as_deref(), Some("555-0100"));
        assert_eq!(student.created_at, created);
        assert_eq!(student.updated_at, later);
    }

    #[test]
    fn locale_date_has_no_leading_zeros() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(locale_date(date), "3/5/2024");
    }
}
