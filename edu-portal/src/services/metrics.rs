//! Derived student metrics
//!
//! GPA is the credit-weighted mean of graded registrations on the 0-20
//! scale, rounded to two decimals, and absent when nothing is graded.

use edu_common::db::programs::{load_field_of_study, FieldOfStudy};
use edu_common::db::registrations::{all_grade_totals, gradebook, GradebookEntry, StudentGradeTotals};
use edu_common::db::students::Student;
use edu_common::db::RegistrationStatus;
use edu_common::Result;
use sqlx::SqlitePool;

/// Metrics shown on the profile and dashboard
#[derive(Debug, Clone)]
pub struct StudentMetrics {
    pub gpa: Option<f64>,
    pub credits_passed: i64,
    /// Program total minus passed credits, `None` without a program
    pub credits_remaining: Option<i64>,
    pub program: Option<FieldOfStudy>,
}

/// Mean GPA of the student's comparison groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortAverages {
    pub same_entry_term: Option<f64>,
    pub same_field: Option<f64>,
    pub same_college: Option<f64>,
    pub university: Option<f64>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn gpa(entries: &[GradebookEntry]) -> Option<f64> {
    let (weighted, credits) = entries
        .iter()
        .filter_map(|e| e.grade.map(|g| (g * e.credits as f64, e.credits)))
        .fold((0.0, 0i64), |(w, c), (gw, gc)| (w + gw, c + gc));

    if credits == 0 {
        None
    } else {
        Some(round2(weighted / credits as f64))
    }
}

pub fn credits_passed(entries: &[GradebookEntry]) -> i64 {
    entries
        .iter()
        .filter(|e| e.status == RegistrationStatus::Passed)
        .map(|e| e.credits)
        .sum()
}

pub fn credits_remaining(program_total: Option<i64>, passed: i64) -> Option<i64> {
    program_total.map(|total| (total - passed).max(0))
}

fn student_gpa(totals: &StudentGradeTotals) -> Option<f64> {
    if totals.graded_credits > 0 {
        Some(totals.weighted_sum / totals.graded_credits as f64)
    } else {
        None
    }
}

fn mean<'a>(gpas: impl Iterator<Item = &'a StudentGradeTotals>) -> Option<f64> {
    let (sum, count) = gpas
        .filter_map(student_gpa)
        .fold((0.0, 0usize), |(s, n), g| (s + g, n + 1));
    if count == 0 {
        None
    } else {
        Some(round2(sum / count as f64))
    }
}

/// Group averages over per-student GPAs; a group the student has no key for is `None`
pub fn cohort_averages(
    totals: &[StudentGradeTotals],
    entry_term_code: Option<&str>,
    field_of_study_id: Option<i64>,
    college_id: Option<i64>,
) -> CohortAverages {
    CohortAverages {
        same_entry_term: entry_term_code.and_then(|code| {
            mean(totals.iter().filter(|t| t.entry_term_code.as_deref() == Some(code)))
        }),
        same_field: field_of_study_id
            .and_then(|id| mean(totals.iter().filter(|t| t.field_of_study_id == Some(id)))),
        same_college: college_id
            .and_then(|id| mean(totals.iter().filter(|t| t.college_id == Some(id)))),
        university: mean(totals.iter()),
    }
}

pub async fn student_metrics(pool: &SqlitePool, student: &Student) -> Result<StudentMetrics> {
    let entries = gradebook(pool, student.id).await?;
    let program = match student.field_of_study_id {
        Some(id) => Some(load_field_of_study(pool, id).await?),
        None => None,
    };

    let passed = credits_passed(&entries);
    Ok(StudentMetrics {
        gpa: gpa(&entries),
        credits_passed: passed,
        credits_remaining: credits_remaining(program.as_ref().map(|p| p.total_credits), passed),
        program,
    })
}

pub async fn cohort_for(pool: &SqlitePool, student: &Student, college_id: Option<i64>) -> Result<CohortAverages> {
    let totals = all_grade_totals(pool).await?;
    Ok(cohort_averages(
        &totals,
        student.entry_term_code.as_deref(),
        student.field_of_study_id,
        college_id,
    ))
}
