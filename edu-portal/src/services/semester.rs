//! Semester unit-selection finalization

use crate::services::enrollment::register_in;
use edu_common::config::EnrollmentPolicy;
use edu_common::db::classes::{claim_class_row, load_class};
use edu_common::db::registrations::{find_registration, insert_semester_registration, is_semester_finalized};
use edu_common::db::students::load_student;
use edu_common::db::terms::find_term_by_code;
use edu_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

/// One selected class and the course it must belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub course_id: i64,
    pub class_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedSemester {
    pub term_code: String,
    /// Classes registered by this call, the rest were already held
    pub newly_registered: usize,
}

/// Register every selected class and record the semester as finalized
///
/// All of it commits together or not at all.
pub async fn finalize(
    pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: i64,
    term_code: &str,
    selections: &[Selection],
) -> Result<FinalizedSemester> {
    if selections.is_empty() {
        return Err(Error::InvalidInput("No classes selected".to_string()));
    }
    let student = load_student(pool, student_id).await?;

    let mut tx = pool.begin().await?;

    // Write lock first, before anything is read
    for selection in selections {
        if !claim_class_row(&mut tx, selection.class_id).await? {
            return Err(Error::NotFound(format!("Class {}", selection.class_id)));
        }
    }

    let term = find_term_by_code(&mut *tx, term_code)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Term {}", term_code)))?;

    let already_finalized = || Error::AlreadyFinalized {
        student_number: student.student_number.clone(),
        term_code: term.code.clone(),
    };
    if is_semester_finalized(&mut *tx, student.id, term.id).await? {
        return Err(already_finalized());
    }

    let mut newly_registered = 0;
    for selection in selections {
        let class = load_class(&mut *tx, selection.class_id).await?;
        if class.term_id != term.id {
            return Err(Error::InvalidInput(format!(
                "Class {} is not offered in term {}",
                class.class_code, term.code
            )));
        }
        if class.course_id != selection.course_id {
            return Err(Error::InvalidInput(format!(
                "Class {} does not belong to course {}",
                class.class_code, selection.course_id
            )));
        }

        if find_registration(&mut *tx, student.id, class.id).await?.is_some() {
            continue;
        }
        register_in(&mut tx, policy, &student, class.id).await?;
        newly_registered += 1;
    }

    insert_semester_registration(&mut tx, student.id, term.id, already_finalized).await?;
    tx.commit().await?;

    info!(
        student_number = %student.student_number,
        term = %term.code,
        classes = selections.len(),
        newly_registered,
        "Finalized semester"
    );
    Ok(FinalizedSemester {
        term_code: term.code.clone(),
        newly_registered,
    })
}
