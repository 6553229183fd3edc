use std::sync::Arc;

use attendance_reports_core::contract::{MockDataStore, MockReportLedger};
use attendance_reports_core::model::{
    AttendanceRecord, AttendanceStatus, CheckIn, CourseYear, NewAttendanceRecord, NewReport,
    NewStudent, ReportFormat, ReportType,
};
use attendance_reports_core::Roster;
use chrono::{NaiveDate, TimeZone, Utc};

fn roster(data: MockDataStore, ledger: MockReportLedger) -> Roster {
    Roster::new(Arc::new(data), Arc::new(ledger))
}

#[tokio::test]
async fn test_check_in_denormalizes_student_fields() {
    let mut data = MockDataStore::new();
    data.expect_get_student().returning(|id| {
        Ok(Some(NewStudent::new("Ravi", CourseYear::Bca2).into_student(
            id.to_string(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )))
    });
    data.expect_add_attendance()
        .withf(|r: &NewAttendanceRecord| {
            r.student_name == "Ravi" && r.course_year == CourseYear::Bca2 && r.notes.is_none()
        })
        .times(1)
        .returning(|r| Ok(r.into_record("a1".into(), Utc::now())));

    let record = roster(data, MockReportLedger::new())
        .check_in(CheckIn {
            student_id: "s9".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            status: AttendanceStatus::Late,
            notes: Some("   ".into()),
        })
        .await
        .expect("check-in should succeed");

    assert_eq!(record.student_id, "s9");
    assert_eq!(record.status, AttendanceStatus::Late);
}

#[tokio::test]
async fn test_check_in_for_unknown_student_is_not_found() {
    let mut data = MockDataStore::new();
    data.expect_get_student().returning(|_| Ok(None));
    data.expect_add_attendance().never();

    let err = roster(data, MockReportLedger::new())
        .check_in(CheckIn {
            student_id: "ghost".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            status: AttendanceStatus::Present,
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_blank_student_name_is_rejected() {
    let mut data = MockDataStore::new();
    data.expect_add_student().never();

    let err = roster(data, MockReportLedger::new())
        .add_student(NewStudent::new("  ", CourseYear::Bca1))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_deleting_unknown_student_is_not_found() {
    let mut data = MockDataStore::new();
    data.expect_delete_student().returning(|_| Ok(None));

    let err = roster(data, MockReportLedger::new())
        .delete_student("ghost")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_dashboard_stats_compute_real_attendance_rate() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut data = MockDataStore::new();
    data.expect_list_students().returning(move || {
        Ok(vec![
            NewStudent::new("A", CourseYear::Bca1).into_student("s1".into(), created),
            NewStudent::new("B", CourseYear::Bca1).into_student("s2".into(), created),
            NewStudent::new("C", CourseYear::Bca3).into_student("s3".into(), created),
        ])
    });
    data.expect_query_attendance().returning(move |_| {
        Ok([AttendanceStatus::Present, AttendanceStatus::Present, AttendanceStatus::Absent]
            .into_iter()
            .enumerate()
            .map(|(i, status)| AttendanceRecord {
                id: format!("a{i}"),
                student_id: "s1".into(),
                student_name: "A".into(),
                course_year: CourseYear::Bca1,
                date: NaiveDate::from_ymd_opt(2024, 2, 1 + i as u32).unwrap(),
                status,
                notes: None,
                created_at: created,
            })
            .collect())
    });
    let mut ledger = MockReportLedger::new();
    ledger.expect_list_reports().returning(move || {
        Ok(vec![NewReport {
            report_type: ReportType::StudentReport,
            student_id: Some("s1".into()),
            student_name: Some("A".into()),
            course_year: Some(CourseYear::Bca1),
            date_range: None,
            format: ReportFormat::Pdf,
            url: "https://cdn.example.test/r.pdf".into(),
        }
        .into_report("r1".into(), created)])
    });

    let stats = roster(data, ledger).dashboard_stats().await.unwrap();
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.students_by_course_year[&CourseYear::Bca1], 2);
    assert_eq!(stats.students_by_course_year[&CourseYear::Bca2], 0);
    assert_eq!(stats.students_by_course_year[&CourseYear::Bca3], 1);
    assert_eq!(stats.total_reports, 1);
    assert_eq!(stats.attendance_rate, 67);
}

#[tokio::test]
async fn test_dashboard_stats_without_attendance_report_zero_rate() {
    let mut data = MockDataStore::new();
    data.expect_list_students().returning(|| Ok(vec![]));
    data.expect_query_attendance().returning(|_| Ok(vec![]));
    let mut ledger = MockReportLedger::new();
    ledger.expect_list_reports().returning(|| Ok(vec![]));

    let stats = roster(data, ledger).dashboard_stats().await.unwrap();
    assert_eq!(stats.total_students, 0);
    assert_eq!(stats.attendance_rate, 0);
}
