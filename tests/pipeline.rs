//! Report pipeline over the real adapters: JSON document store and local artifacts.
use std::sync::Arc;

use attendance_reports::document_store::{DocumentStore, REPORTS_FILE};
use attendance_reports::storage::LocalArtifactStore;
use attendance_reports_core::model::{
    AttendanceStatus, CheckIn, CourseYear, NewStudent, ReportFormat, ReportType,
};
use attendance_reports_core::{ReportComposer, ReportError, ReportRequest, Roster};
use chrono::NaiveDate;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    data_dir: std::path::PathBuf,
    artifacts_dir: std::path::PathBuf,
    roster: Roster,
    composer: ReportComposer,
}

async fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let artifacts_dir = tmp.path().join("artifacts");
    let data_dir = tmp.path().join("data");
    let store = Arc::new(DocumentStore::open(&data_dir).await.unwrap());
    let artifacts = Arc::new(LocalArtifactStore::new(
        &artifacts_dir,
        Some("https://files.example.test".into()),
    ));
    Fixture {
        roster: Roster::new(store.clone(), store.clone()),
        composer: ReportComposer::new(store.clone(), artifacts, store),
        data_dir,
        artifacts_dir,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn test_student_report_end_to_end() {
    let f = fixture().await;
    let student = f
        .roster
        .add_student(NewStudent::new("Meera", CourseYear::Bca2))
        .await
        .unwrap();
    for (d, status) in [(1, AttendanceStatus::Present), (2, AttendanceStatus::Absent)] {
        f.roster
            .check_in(CheckIn {
                student_id: student.id.clone(),
                date: NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
                status,
                notes: None,
            })
            .await
            .unwrap();
    }

    let first = f.composer.compose_student_report(&student.id).await.unwrap();
    let second = f.composer.compose_student_report(&student.id).await.unwrap();
    assert_ne!(first, second);

    for url in [&first, &second] {
        let name = url
            .strip_prefix("https://files.example.test/")
            .expect("url built from the configured base");
        let bytes = std::fs::read(f.artifacts_dir.join(name)).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    let reports = f.composer.saved_reports().await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.report_type == ReportType::StudentReport));
    assert_eq!(reports[0].url, second, "newest first");

    let stats = f.roster.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_reports, 2);
    assert_eq!(stats.attendance_rate, 50);
}

#[tokio::test]
async fn test_performance_excel_report_end_to_end() {
    let f = fixture().await;
    for name in ["Amit", "Bela"] {
        let s = f
            .roster
            .add_student(NewStudent::new(name, CourseYear::Bca1))
            .await
            .unwrap();
        f.roster
            .check_in(CheckIn {
                student_id: s.id,
                date: NaiveDate::from_ymd_opt(2024, 8, 5).unwrap(),
                status: AttendanceStatus::Present,
                notes: Some("on time".into()),
            })
            .await
            .unwrap();
    }

    let report = f
        .composer
        .generate_report(ReportRequest {
            report_type: ReportType::Performance,
            course_year: Some(CourseYear::Bca1),
            from: NaiveDate::from_ymd_opt(2024, 8, 1),
            to: NaiveDate::from_ymd_opt(2024, 8, 31),
            format: ReportFormat::Excel,
        })
        .await
        .unwrap();

    assert!(report.url.ends_with(".xls"));
    let name = report.url.trim_start_matches("https://files.example.test/");
    let xml = std::fs::read_to_string(f.artifacts_dir.join(name)).unwrap();
    assert!(xml.contains("<Workbook"));
    assert!(xml.contains(">Amit<") && xml.contains(">Bela<"));
}

#[tokio::test]
async fn test_ledger_write_failure_leaves_no_entry_and_no_artifact() {
    let f = fixture().await;
    let student = f
        .roster
        .add_student(NewStudent::new("Ravi", CourseYear::Bca1))
        .await
        .unwrap();
    std::fs::create_dir(f.data_dir.join(format!(".{REPORTS_FILE}.tmp"))).unwrap();

    let err = f.composer.compose_student_report(&student.id).await.unwrap_err();
    assert!(
        matches!(err, ReportError::Upstream { operation: "append ledger entry", .. }),
        "got: {err:?}"
    );
    assert!(f.composer.saved_reports().await.unwrap().is_empty());
    assert_eq!(f.roster.dashboard_stats().await.unwrap().total_reports, 0);

    let leftovers: Vec<_> = std::fs::read_dir(&f.artifacts_dir)
        .map(|entries| entries.filter_map(Result::ok).map(|e| e.file_name()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "orphaned artifacts: {leftovers:?}");
}
