//! Gradebook aggregation and lateness.
//!
//! Consumes submission records plus the homework deadline and produces
//! per-student rollups. Read-only and side-effect free: a pure function of
//! its inputs and the reference-clock offset, so repeated invocation with
//! identical inputs is idempotent.
//!
//! Timestamps are written with the server's UTC wall clock; deadlines are
//! instructor wall clock. The public entry points compute the offset
//! between the two (`utc_now - local_now`) once per call and subtract it
//! from each student's latest submission before comparing against the
//! deadline.

use chrono::{Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{StudentId, SubmissionRecord};

const SECS_PER_DAY: i64 = 86_400;

/// Per-student rollup for one homework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,

    /// Sum of `student_score` over the student's live records. Each test
    /// case contributes once, since the gradebook keeps at most one record
    /// per (student, test case).
    pub total_score: f64,

    /// Latest submission time, normalized to the deadline's clock.
    pub latest_submission: NaiveDateTime,

    pub deadline: NaiveDateTime,

    /// Whole days past the deadline, floored at zero.
    pub days_late: i64,
}

/// Offset between the record clock (UTC) and the caller's local clock.
pub fn clock_offset() -> Duration {
    Utc::now().naive_utc() - Local::now().naive_local()
}

/// Summarize every student that has at least one record. Students with no
/// records never appear; there is no synthetic zero-score row.
pub fn summarize(records: &[SubmissionRecord], deadline: NaiveDateTime) -> Vec<StudentSummary> {
    summarize_with_offset(records, deadline, clock_offset())
}

/// Single-student form of [`summarize`]. `None` when the student has no
/// records for this homework.
pub fn summarize_student(
    records: &[SubmissionRecord],
    deadline: NaiveDateTime,
    student: &StudentId,
) -> Option<StudentSummary> {
    let own: Vec<SubmissionRecord> = records
        .iter()
        .filter(|r| r.matches_student(student))
        .cloned()
        .collect();
    summarize_with_offset(&own, deadline, clock_offset())
        .into_iter()
        .next()
}

/// Pure core of the engine: the clock offset is an explicit input.
pub fn summarize_with_offset(
    records: &[SubmissionRecord],
    deadline: NaiveDateTime,
    offset: Duration,
) -> Vec<StudentSummary> {
    let mut per_student: BTreeMap<String, (f64, NaiveDateTime)> = BTreeMap::new();

    for record in records {
        let entry = per_student
            .entry(record.student_id().to_string())
            .or_insert((0.0, record.timestamp));
        entry.0 += record.student_score;
        if record.timestamp > entry.1 {
            entry.1 = record.timestamp;
        }
    }

    per_student
        .into_iter()
        .map(|(student_id, (total_score, latest))| {
            let latest_submission = latest - offset;
            StudentSummary {
                student_id,
                total_score,
                latest_submission,
                deadline,
                days_late: days_late(latest_submission, deadline),
            }
        })
        .collect()
}

/// Ceiling of the overshoot in whole days, never negative.
fn days_late(latest_submission: NaiveDateTime, deadline: NaiveDateTime) -> i64 {
    let late_secs = (latest_submission - deadline).num_seconds();
    if late_secs <= 0 {
        0
    } else {
        (late_secs + SECS_PER_DAY - 1) / SECS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseId, HomeworkId, Score};
    use chrono::NaiveDate;

    fn hw() -> HomeworkId {
        HomeworkId::derive(&CourseId("CIS545_F24".to_string()), 1)
    }

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn record(student: &str, test_case: &str, score: f64, max: f64, ts: NaiveDateTime) -> SubmissionRecord {
        let student = StudentId::new(student).unwrap();
        SubmissionRecord::new(hw(), &student, test_case, Score::new(score, max), ts)
    }

    #[test]
    fn test_total_score_sums_across_test_cases() {
        let deadline = at(21, 23, 59);
        let records = vec![
            record("alice", "tc1", 3.0, 5.0, at(20, 10, 0)),
            record("alice", "tc2", 4.0, 4.0, at(20, 11, 0)),
        ];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_score, 7.0);
    }

    #[test]
    fn test_on_time_submission_has_zero_days_late() {
        let deadline = at(21, 23, 59);
        let records = vec![record("alice", "q1", 10.0, 10.0, at(20, 12, 0))];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries[0].days_late, 0);
    }

    #[test]
    fn test_submission_exactly_at_deadline_is_not_late() {
        let deadline = at(21, 23, 59);
        let records = vec![record("alice", "q1", 10.0, 10.0, deadline)];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries[0].days_late, 0);
    }

    #[test]
    fn test_twenty_five_hours_late_is_two_days() {
        let deadline = at(21, 12, 0);
        // 25 hours past the deadline: ceil(1.04 days) = 2.
        let records = vec![record("alice", "q1", 10.0, 10.0, at(22, 13, 0))];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries[0].days_late, 2);
    }

    #[test]
    fn test_one_second_late_is_one_day() {
        let deadline = at(21, 12, 0);
        let records = vec![record("alice", "q1", 10.0, 10.0, deadline + Duration::seconds(1))];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries[0].days_late, 1);
    }

    #[test]
    fn test_clock_offset_is_subtracted_before_comparison() {
        let deadline = at(21, 12, 0);
        // Record clock runs 5 hours ahead of the deadline clock. A record
        // stamped 3 hours "past" the deadline is actually 2 hours early.
        let offset = Duration::hours(5);
        let records = vec![record("alice", "q1", 10.0, 10.0, at(21, 15, 0))];
        let summaries = summarize_with_offset(&records, deadline, offset);
        assert_eq!(summaries[0].days_late, 0);
        assert_eq!(summaries[0].latest_submission, at(21, 10, 0));
    }

    #[test]
    fn test_latest_submission_is_max_over_records() {
        let deadline = at(21, 23, 59);
        let records = vec![
            record("alice", "tc1", 3.0, 5.0, at(22, 10, 0)),
            record("alice", "tc2", 4.0, 4.0, at(20, 11, 0)),
        ];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries[0].latest_submission, at(22, 10, 0));
        assert_eq!(summaries[0].days_late, 1);
    }

    #[test]
    fn test_students_without_records_are_excluded() {
        let deadline = at(21, 23, 59);
        let summaries = summarize_with_offset(&[], deadline, Duration::zero());
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_summarize_student_filters_to_own_records() {
        let deadline = at(21, 23, 59);
        let records = vec![
            record("alice", "tc1", 3.0, 5.0, at(20, 10, 0)),
            record("bob", "tc1", 5.0, 5.0, at(20, 10, 0)),
        ];
        let alice = StudentId::new("alice").unwrap();
        let summary = summarize_student(&records, deadline, &alice).unwrap();
        assert_eq!(summary.student_id, "alice");
        assert_eq!(summary.total_score, 3.0);

        let carol = StudentId::new("carol").unwrap();
        assert!(summarize_student(&records, deadline, &carol).is_none());
    }

    #[test]
    fn test_summaries_cover_all_students() {
        let deadline = at(21, 23, 59);
        let records = vec![
            record("alice", "tc1", 3.0, 5.0, at(20, 10, 0)),
            record("bob", "tc1", 5.0, 5.0, at(20, 10, 0)),
            record("bob", "tc2", 2.0, 4.0, at(20, 12, 0)),
        ];
        let summaries = summarize_with_offset(&records, deadline, Duration::zero());
        assert_eq!(summaries.len(), 2);
        let bob = summaries.iter().find(|s| s.student_id == "bob").unwrap();
        assert_eq!(bob.total_score, 7.0);
    }
}
