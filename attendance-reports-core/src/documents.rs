//! Builders that turn fetched records into [`ReportDocument`]s.
//!
//! Builders never reorder attendance: rows appear in the order they were handed
//! in, which for every caller is the store's date-descending order.

use std::collections::HashMap;

use crate::model::{locale_date, AttendanceRecord, CourseYear, DateRange, ReportType, Student};
use crate::render::ReportDocument;
use crate::summary::AttendanceSummary;

/// Placeholder for absent profile fields.
pub const NOT_AVAILABLE: &str = "N/A";

fn or_na(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn period(range: Option<DateRange>) -> String {
    range.map_or_else(|| "All dates".to_string(), |r| r.to_string())
}

/// Single-student report: profile header, summary, attendance table.
pub fn student_report(
    student: &Student,
    records: &[AttendanceRecord],
    summary: &AttendanceSummary,
) -> ReportDocument {
    ReportDocument::new(format!("Student Report: {}", student.name))
        .fields(
            None,
            [
                ("Course", student.course_year.label().to_string()),
                ("Parent Name", or_na(&student.parent_name)),
                ("Roll Number", or_na(&student.roll_number)),
                ("Email", or_na(&student.email)),
                ("Phone", or_na(&student.phone)),
                ("Parent Phone", or_na(&student.parent_phone)),
            ],
        )
        .fields(
            Some("Attendance Summary"),
            [
                ("Total Classes", summary.total.to_string()),
                ("Present", summary.present.to_string()),
                ("Absent", summary.absent.to_string()),
                ("Attendance Rate", format!("{}%", summary.rate)),
            ],
        )
        .table(
            "Attendance Records",
            &["Date", "Status", "Notes"],
            records
                .iter()
                .map(|r| {
                    vec![
                        locale_date(r.date),
                        r.status.label().to_string(),
                        r.notes.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        )
}

/// Per-student summaries for one course-year.
pub fn cohort_student_report(
    course_year: CourseYear,
    range: Option<DateRange>,
    students: &[Student],
    records: &[AttendanceRecord],
) -> ReportDocument {
    let by_student = group_by_student(records);
    let rows = students
        .iter()
        .map(|student| {
            let summary = by_student
                .get(student.id.as_str())
                .map(|rs| AttendanceSummary::from_records(rs.iter().copied()))
                .unwrap_or_default();
            vec![
                student.name.clone(),
                or_na(&student.roll_number),
                summary.total.to_string(),
                summary.present.to_string(),
                summary.absent.to_string(),
                summary.late.to_string(),
                summary.excused.to_string(),
                format!("{}%", summary.rate),
            ]
        })
        .collect();

    ReportDocument::new(format!("{}: {}", ReportType::Student.title(), course_year))
        .fields(
            None,
            [
                ("Course", course_year.label().to_string()),
                ("Period", period(range)),
                ("Students", students.len().to_string()),
            ],
        )
        .table(
            "Students",
            &["Name", "Roll Number", "Total", "Present", "Absent", "Late", "Excused", "Rate"],
            rows,
        )
}

/// Every check-in of a course-year within the range, with an aggregate summary.
pub fn attendance_report(
    course_year: CourseYear,
    range: DateRange,
    records: &[AttendanceRecord],
) -> ReportDocument {
    let summary = AttendanceSummary::from_records(records);
    ReportDocument::new(format!("{}: {}", ReportType::Attendance.title(), course_year))
        .fields(
            None,
            [
                ("Course", course_year.label().to_string()),
                ("Period", range.to_string()),
            ],
        )
        .fields(Some("Attendance Summary"), summary_fields(&summary))
        .table(
            "Attendance Records",
            &["Date", "Student", "Status", "Notes"],
            records
                .iter()
                .map(|r| {
                    vec![
                        locale_date(r.date),
                        r.student_name.clone(),
                        r.status.label().to_string(),
                        r.notes.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        )
}

/// Students ranked by attendance rate (then name) within the range.
pub fn performance_report(
    course_year: CourseYear,
    range: DateRange,
    students: &[Student],
    records: &[AttendanceRecord],
) -> ReportDocument {
    let by_student = group_by_student(records);
    let mut ranked: Vec<(&Student, AttendanceSummary)> = students
        .iter()
        .map(|s| {
            let summary = by_student
                .get(s.id.as_str())
                .map(|rs| AttendanceSummary::from_records(rs.iter().copied()))
                .unwrap_or_default();
            (s, summary)
        })
        .collect();
    ranked.sort_by(|(a, sa), (b, sb)| sb.rate.cmp(&sa.rate).then_with(|| a.name.cmp(&b.name)));

    let cohort = AttendanceSummary::from_records(records);
    let rows = ranked
        .iter()
        .enumerate()
        .map(|(i, (student, summary))| {
            vec![
                (i + 1).to_string(),
                student.name.clone(),
                or_na(&student.roll_number),
                summary.total.to_string(),
                summary.present.to_string(),
                format!("{}%", summary.rate),
            ]
        })
        .collect();

    ReportDocument::new(format!("{}: {}", ReportType::Performance.title(), course_year))
        .fields(
            None,
            [
                ("Course", course_year.label().to_string()),
                ("Period", range.to_string()),
                ("Students", students.len().to_string()),
                ("Cohort Attendance Rate", format!("{}%", cohort.rate)),
            ],
        )
        .table(
            "Ranking",
            &["Rank", "Name", "Roll Number", "Classes", "Present", "Rate"],
            rows,
        )
}

fn summary_fields(summary: &AttendanceSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Total Records", summary.total.to_string()),
        ("Present", summary.present.to_string()),
        ("Absent", summary.absent.to_string()),
        ("Late", summary.late.to_string()),
        ("Excused", summary.excused.to_string()),
        ("Attendance Rate", format!("{}%", summary.rate)),
    ]
}

fn group_by_student(records: &[AttendanceRecord]) -> HashMap<&str, Vec<&AttendanceRecord>> {
    let mut grouped: HashMap<&str, Vec<&AttendanceRecord>> = HashMap::new();
    for record in records {
        grouped.entry(record.student_id.as_str()).or_default().push(record);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceStatus, NewStudent};
    use crate::render::Section;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn student(id: &str, name: &str) -> Student {
        NewStudent::new(name, CourseYear::Bca2)
            .into_student(id.into(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn record(
        student_id: &str,
        day: u32,
        status: AttendanceStatus,
        notes: Option<&str>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{student_id}-{day}"),
            student_id: student_id.into(),
            student_name: student_id.to_uppercase(),
            course_year: CourseYear::Bca2,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            status,
            notes: notes.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
        }
    }

    fn table_rows(doc: &ReportDocument) -> Vec<Vec<String>> {
        doc.tables().next().expect("document should have a table").rows.clone()
    }

    #[test]
    fn student_report_defaults_missing_profile_fields() {
        let s = student("s1", "Ravi");
        let doc = student_report(&s, &[], &AttendanceSummary::default());

        assert_eq!(doc.title, "Student Report: Ravi");
        let Section::Fields(header) = &doc.sections[0] else {
            panic!("first section should be the profile header");
        };
        assert!(header
            .fields
            .iter()
            .filter(|(label, _)| label != "Course")
            .all(|(_, value)| value == NOT_AVAILABLE));
    }

    #[test]
    fn student_report_keeps_fetched_order_and_blanks_missing_notes() {
        let s = student("s1", "Ravi");
        let records = vec![
            record("s1", 9, AttendanceStatus::Absent, None),
            record("s1", 4, AttendanceStatus::Present, Some("left early")),
            record("s1", 1, AttendanceStatus::Late, None),
        ];
        let summary = AttendanceSummary::from_records(&records);
        let rows = table_rows(&student_report(&s, &records, &summary));

        assert_eq!(
            rows,
            vec![
                vec!["3/9/2024".to_string(), "absent".into(), "".into()],
                vec!["3/4/2024".to_string(), "present".into(), "left early".into()],
                vec!["3/1/2024".to_string(), "late".into(), "".into()],
            ]
        );
        assert!(rows.iter().flatten().all(|cell| cell != "null"));
    }

    #[test]
    fn performance_report_ranks_by_rate_then_name() {
        let students = vec![student("a", "Zoya"), student("b", "Amit"), student("c", "Bela")];
        let records = vec![
            record("a", 2, AttendanceStatus::Present, None),
            record("b", 2, AttendanceStatus::Present, None),
            record("c", 2, AttendanceStatus::Absent, None),
        ];
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        let rows = table_rows(&performance_report(CourseYear::Bca2, range, &students, &records));
        let names: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(names, vec!["Amit", "Zoya", "Bela"]);
        assert_eq!(rows[2][5], "0%");
    }

    #[test]
    fn cohort_report_lists_students_without_attendance() {
        let students = vec![student("a", "Zoya")];
        let rows = table_rows(&cohort_student_report(CourseYear::Bca2, None, &students, &[]));
        assert_eq!(rows[0][2], "0");
        assert_eq!(rows[0][7], "0%");
    }
}
