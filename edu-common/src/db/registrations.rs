//! Student class registrations and semester finalization rows

use crate::db::classes::{claim_class_row, class_columns, class_from_row, load_class, seat_count, ClassRecord};
use crate::db::models::{RegistrationStatus, Weekday};
use crate::validation::validate_grade;
use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub status: RegistrationStatus,
    pub grade: Option<f64>,
    pub notes: Option<String>,
    pub registration_date: String,
}

/// One registration joined with its course credits
#[derive(Debug, Clone, PartialEq)]
pub struct GradebookEntry {
    pub status: RegistrationStatus,
    pub grade: Option<f64>,
    pub credits: i64,
}

/// Credit-weighted grade totals of one student
#[derive(Debug, Clone, PartialEq)]
pub struct StudentGradeTotals {
    pub student_id: i64,
    pub entry_term_code: Option<String>,
    pub field_of_study_id: Option<i64>,
    pub college_id: Option<i64>,
    pub weighted_sum: f64,
    pub graded_credits: i64,
}

pub async fn find_registration<'e, E: SqliteExecutor<'e>>(
    exec: E,
    student_id: i64,
    class_id: i64,
) -> Result<Option<Registration>> {
    let row = sqlx::query(
        r#"
        SELECT id, student_id, class_id, status, grade, notes, registration_date
        FROM student_class_registrations
        WHERE student_id = ? AND class_id = ?
        "#,
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_optional(exec)
    .await?;

    row.map(|row| {
        let status: String = row.get("status");
        Ok(Registration {
            id: row.get("id"),
            student_id: row.get("student_id"),
            class_id: row.get("class_id"),
            status: RegistrationStatus::from_code(&status)?,
            grade: row.get("grade"),
            notes: row.get("notes"),
            registration_date: row.get("registration_date"),
        })
    })
    .transpose()
}

/// Insert a `registered` row without grade
///
/// A concurrent insert of the same pair is reported through `on_duplicate`.
pub async fn insert_registration(
    conn: &mut SqliteConnection,
    student_id: i64,
    class_id: i64,
    on_duplicate: impl FnOnce() -> Error,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO student_class_registrations (student_id, class_id, status) VALUES (?, ?, 'R')",
    )
    .bind(student_id)
    .bind(class_id)
    .execute(conn)
    .await
    .map_err(|e| Error::on_unique_violation(e, on_duplicate))?;

    Ok(result.last_insert_rowid())
}

/// Whether the student passed any class of the course
pub async fn has_passed_course(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<bool> {
    let passed: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM student_class_registrations r
            JOIN classes c ON c.id = r.class_id
            WHERE r.student_id = ? AND c.course_id = ? AND r.status = 'P'
        )
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(conn)
    .await?;
    Ok(passed)
}

/// Whether the student holds a `registered` class of the course in the term
pub async fn is_taking_course_in_term(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
    term_id: i64,
) -> Result<bool> {
    let taking: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM student_class_registrations r
            JOIN classes c ON c.id = r.class_id
            WHERE r.student_id = ? AND c.course_id = ? AND c.term_id = ? AND r.status = 'R'
        )
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(term_id)
    .fetch_one(conn)
    .await?;
    Ok(taking)
}

/// Classes the student holds (status registered) in a term on a weekday
pub async fn student_day_classes(
    conn: &mut SqliteConnection,
    student_id: i64,
    term_id: i64,
    day: Weekday,
) -> Result<Vec<ClassRecord>> {
    let rows = sqlx::query(concat!(
        "SELECT ",
        class_columns!("c"),
        " FROM student_class_registrations r \
         JOIN classes c ON c.id = r.class_id \
         WHERE r.student_id = ? AND c.term_id = ? AND c.day_of_week = ? AND r.status = 'R' \
           AND c.is_active = 1 \
         ORDER BY c.start_time"
    ))
    .bind(student_id)
    .bind(term_id)
    .bind(day.code())
    .fetch_all(conn)
    .await?;

    rows.iter().map(class_from_row).collect()
}

/// Record a status change and optional grade
///
/// A grade is accepted only together with `passed` or `failed`. Moving a
/// withdrawn or incomplete row back to a seat-holding status needs a free
/// seat, checked under the class row lock.
pub async fn set_outcome(
    pool: &SqlitePool,
    student_id: i64,
    class_id: i64,
    status: RegistrationStatus,
    grade: Option<f64>,
) -> Result<()> {
    if let Some(grade) = grade {
        validate_grade(grade)?;
        if !matches!(status, RegistrationStatus::Passed | RegistrationStatus::Failed) {
            return Err(Error::InvalidInput(format!(
                "A grade requires status passed or failed, not {:?}",
                status
            )));
        }
    }

    let not_found = || {
        Error::NotFound(format!(
            "Registration of student {} in class {}",
            student_id, class_id
        ))
    };

    let mut tx = pool.begin().await?;
    if !claim_class_row(&mut tx, class_id).await? {
        return Err(not_found());
    }

    let current = find_registration(&mut *tx, student_id, class_id)
        .await?
        .ok_or_else(not_found)?;

    if status.holds_seat() && !current.status.holds_seat() {
        let class = load_class(&mut *tx, class_id).await?;
        if seat_count(&mut *tx, class_id).await? >= class.capacity {
            return Err(Error::ClassFull {
                class_code: class.class_code,
                capacity: class.capacity,
            });
        }
    }

    sqlx::query(
        r#"
        UPDATE student_class_registrations
        SET status = ?, grade = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(status.code())
    .bind(grade)
    .bind(current.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(student_id, class_id, status = %status, ?grade, "Recorded registration outcome");
    Ok(())
}

/// Every registration of a student with its course credits
pub async fn gradebook<'e, E: SqliteExecutor<'e>>(exec: E, student_id: i64) -> Result<Vec<GradebookEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT r.status, r.grade, co.credits
        FROM student_class_registrations r
        JOIN classes c ON c.id = r.class_id
        JOIN courses co ON co.id = c.course_id
        WHERE r.student_id = ?
        "#,
    )
    .bind(student_id)
    .fetch_all(exec)
    .await?;

    rows.iter()
        .map(|row| {
            let status: String = row.get("status");
            Ok(GradebookEntry {
                status: RegistrationStatus::from_code(&status)?,
                grade: row.get("grade"),
                credits: row.get("credits"),
            })
        })
        .collect()
}

/// Grade totals of every student with at least one graded registration
pub async fn all_grade_totals(pool: &SqlitePool) -> Result<Vec<StudentGradeTotals>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id AS student_id, s.entry_term_code, s.field_of_study_id, f.college_id,
               SUM(r.grade * co.credits) AS weighted_sum,
               SUM(co.credits) AS graded_credits
        FROM students s
        JOIN student_class_registrations r ON r.student_id = s.id AND r.grade IS NOT NULL
        JOIN classes c ON c.id = r.class_id
        JOIN courses co ON co.id = c.course_id
        LEFT JOIN fields_of_study f ON f.id = s.field_of_study_id
        GROUP BY s.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| StudentGradeTotals {
            student_id: row.get("student_id"),
            entry_term_code: row.get("entry_term_code"),
            field_of_study_id: row.get("field_of_study_id"),
            college_id: row.get("college_id"),
            weighted_sum: row.get("weighted_sum"),
            graded_credits: row.get("graded_credits"),
        })
        .collect())
}

/// Record that the student finalized unit selection for the term
pub async fn insert_semester_registration(
    conn: &mut SqliteConnection,
    student_id: i64,
    term_id: i64,
    on_duplicate: impl FnOnce() -> Error,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO semester_registrations (student_id, term_id) VALUES (?, ?)",
    )
    .bind(student_id)
    .bind(term_id)
    .execute(conn)
    .await
    .map_err(|e| Error::on_unique_violation(e, on_duplicate))?;

    Ok(result.last_insert_rowid())
}

pub async fn is_semester_finalized<'e, E: SqliteExecutor<'e>>(
    exec: E,
    student_id: i64,
    term_id: i64,
) -> Result<bool> {
    let finalized: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM semester_registrations WHERE student_id = ? AND term_id = ?)",
    )
    .bind(student_id)
    .bind(term_id)
    .fetch_one(exec)
    .await?;
    Ok(finalized)
}
