//! Enrollment consistency engine
//!
//! Validates and commits one student-to-class registration. Checks run in a
//! fixed order and the first failing one is reported:
//!
//! 1. class exists and is active
//! 2. policy: student active, term open for registration
//! 3. no existing registration for the pair
//! 4. registered-count below capacity
//! 5. mandatory prerequisites passed, mandatory corequisites passed or taken
//! 6. no overlap with the student's other classes that day
//!
//! Everything runs inside one transaction whose first statement writes the
//! class row, so concurrent registrations for the same class are serialized
//! before any of the checks read.

use edu_common::config::EnrollmentPolicy;
use edu_common::db::classes::{claim_class_row, load_class, seat_count};
use edu_common::db::courses::{load_course, requisites, RequisiteKind};
use edu_common::db::registrations::{
    find_registration, has_passed_course, insert_registration, is_taking_course_in_term,
    student_day_classes,
};
use edu_common::db::students::{load_student, Student};
use edu_common::db::terms::load_term;
use edu_common::validation::intervals_overlap;
use edu_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

/// Register a student in a class, returning the new registration id
pub async fn register(
    pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: i64,
    class_id: i64,
) -> Result<i64> {
    let student = load_student(pool, student_id).await?;

    let mut tx = pool.begin().await?;
    let registration_id = register_in(&mut tx, policy, &student, class_id).await?;
    tx.commit().await?;

    info!(
        student_number = %student.student_number,
        class_id,
        registration_id,
        "Registered student in class"
    );
    Ok(registration_id)
}

/// Apply every registration rule on an open transaction and insert the row
///
/// Callers compose this into larger transactions (semester finalization).
pub async fn register_in(
    conn: &mut SqliteConnection,
    policy: &EnrollmentPolicy,
    student: &Student,
    class_id: i64,
) -> Result<i64> {
    if !claim_class_row(conn, class_id).await? {
        return Err(Error::NotFound(format!("Class {}", class_id)));
    }
    let class = load_class(&mut *conn, class_id).await?;
    if !class.is_active {
        return Err(Error::NotFound(format!("Class {}", class.class_code)));
    }

    if policy.require_active_student && !student.is_active() {
        return Err(Error::StudentInactive {
            student_number: student.student_number.clone(),
        });
    }
    if policy.require_open_registration {
        let term = load_term(&mut *conn, class.term_id).await?;
        if !term.is_registration_open {
            return Err(Error::RegistrationClosed { term_code: term.code });
        }
    }

    let already_registered = || Error::AlreadyRegistered {
        student_number: student.student_number.clone(),
        class_code: class.class_code.clone(),
    };

    if find_registration(&mut *conn, student.id, class.id).await?.is_some() {
        return Err(already_registered());
    }

    let taken = seat_count(&mut *conn, class.id).await?;
    if taken >= class.capacity {
        return Err(Error::ClassFull {
            class_code: class.class_code.clone(),
            capacity: class.capacity,
        });
    }

    if policy.enforce_prerequisites {
        let course = load_course(&mut *conn, class.course_id).await?;

        for prerequisite in requisites(&mut *conn, RequisiteKind::Prerequisite, course.id).await? {
            if !prerequisite.is_mandatory {
                continue;
            }
            if !has_passed_course(conn, student.id, prerequisite.course_id).await? {
                return Err(Error::PrerequisiteNotMet {
                    course_code: course.code,
                    prerequisite_code: prerequisite.code,
                });
            }
        }

        for corequisite in requisites(&mut *conn, RequisiteKind::Corequisite, course.id).await? {
            if !corequisite.is_mandatory {
                continue;
            }
            let satisfied = has_passed_course(conn, student.id, corequisite.course_id).await?
                || is_taking_course_in_term(conn, student.id, corequisite.course_id, class.term_id)
                    .await?;
            if !satisfied {
                return Err(Error::CorequisiteNotMet {
                    course_code: course.code,
                    corequisite_code: corequisite.code,
                });
            }
        }
    }

    if policy.enforce_schedule_conflicts {
        let same_day =
            student_day_classes(conn, student.id, class.term_id, class.day_of_week).await?;
        if let Some(other) = same_day.iter().find(|other| {
            intervals_overlap(class.start_time, class.end_time, other.start_time, other.end_time)
        }) {
            return Err(Error::TimeConflict {
                class_code: class.class_code.clone(),
                conflicting_class: other.class_code.clone(),
            });
        }
    }

    debug!(student_id = student.id, class_id, taken, capacity = class.capacity, "Seat available");
    insert_registration(conn, student.id, class.id, already_registered).await
}
