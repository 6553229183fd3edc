use serde::Serialize;

use crate::model::{AttendanceRecord, AttendanceStatus};

/// Tally of attendance statuses plus the rounded attendance rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    /// Percentage of `present` over `total`, rounded; 0 when `total` is 0.
    pub rate: u32,
}

impl AttendanceSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut summary = AttendanceSummary::default();
        for record in records {
            summary.total += 1;
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::Late => summary.late += 1,
                AttendanceStatus::Excused => summary.excused += 1,
            }
        }
        summary.rate = attendance_rate(summary.present, summary.total);
        summary
    }
}

/// `round(present / total * 100)`, defined as 0 for an empty history.
pub fn attendance_rate(present: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((present as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseYear;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(day: u32, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("a{day}"),
            student_id: "s1".into(),
            student_name: "Asha".into(),
            course_year: CourseYear::Bca1,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            status,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_history_has_zero_rate() {
        let summary = AttendanceSummary::from_records(Vec::<AttendanceRecord>::new().iter());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.rate, 0);
    }

    #[test]
    fn seven_of_ten_present_is_seventy_percent() {
        let records: Vec<_> = (1..=10)
            .map(|day| {
                let status = if day <= 7 {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                };
                record(day, status)
            })
            .collect();

        let summary = AttendanceSummary::from_records(&records);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.present, 7);
        assert_eq!(summary.absent, 3);
        assert_eq!(summary.rate, 70);
    }

    #[test]
    fn late_and_excused_count_toward_total_only() {
        let records = vec![
            record(1, AttendanceStatus::Present),
            record(2, AttendanceStatus::Late),
            record(3, AttendanceStatus::Excused),
        ];
        let summary = AttendanceSummary::from_records(&records);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.excused, 1);
        assert_eq!(summary.rate, 33);
    }

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(attendance_rate(1, 8), 13); // 12.5
        assert_eq!(attendance_rate(2, 3), 67);
        assert_eq!(attendance_rate(3, 3), 100);
    }
}
