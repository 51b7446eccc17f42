//! Professor-to-class assignments
//!
//! The one-primary-per-class rule is checked by the caller inside its
//! transaction; the partial unique index `idx_assignments_one_primary`
//! backs it up.

use crate::{Error, Result};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub professor_id: i64,
    pub class_id: i64,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub assignment_date: String,
}

fn assignment_from_row(row: &SqliteRow) -> Assignment {
    Assignment {
        id: row.get("id"),
        professor_id: row.get("professor_id"),
        class_id: row.get("class_id"),
        is_primary: row.get("is_primary"),
        notes: row.get("notes"),
        assignment_date: row.get("assignment_date"),
    }
}

/// No-op write on the assignment row so the update transaction holds the write lock
pub async fn claim_assignment_row(conn: &mut SqliteConnection, assignment_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE professor_course_assignments SET notes = notes WHERE id = ?")
        .bind(assignment_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn load_assignment(conn: &mut SqliteConnection, assignment_id: i64) -> Result<Assignment> {
    let row = sqlx::query(
        r#"
        SELECT id, professor_id, class_id, is_primary, notes, assignment_date
        FROM professor_course_assignments WHERE id = ?
        "#,
    )
    .bind(assignment_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Assignment {}", assignment_id)))?;

    Ok(assignment_from_row(&row))
}

pub async fn find_assignment(
    conn: &mut SqliteConnection,
    professor_id: i64,
    class_id: i64,
) -> Result<Option<Assignment>> {
    let row = sqlx::query(
        r#"
        SELECT id, professor_id, class_id, is_primary, notes, assignment_date
        FROM professor_course_assignments WHERE professor_id = ? AND class_id = ?
        "#,
    )
    .bind(professor_id)
    .bind(class_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.as_ref().map(assignment_from_row))
}

/// Primary assignment of a class other than `exclude_id`
pub async fn find_other_primary(
    conn: &mut SqliteConnection,
    class_id: i64,
    exclude_id: Option<i64>,
) -> Result<Option<Assignment>> {
    let row = sqlx::query(
        r#"
        SELECT id, professor_id, class_id, is_primary, notes, assignment_date
        FROM professor_course_assignments
        WHERE class_id = ? AND is_primary = 1 AND id <> ?
        "#,
    )
    .bind(class_id)
    .bind(exclude_id.unwrap_or(-1))
    .fetch_optional(conn)
    .await?;

    Ok(row.as_ref().map(assignment_from_row))
}

pub async fn insert_assignment(
    conn: &mut SqliteConnection,
    professor_id: i64,
    class_id: i64,
    is_primary: bool,
    notes: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO professor_course_assignments (professor_id, class_id, is_primary, notes)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(professor_id)
    .bind(class_id)
    .bind(is_primary)
    .bind(notes)
    .execute(conn)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!(
                "Professor {} assignment to class {} conflicts with an existing row",
                professor_id, class_id
            ))
        })
    })?;

    Ok(result.last_insert_rowid())
}

pub async fn update_assignment(
    conn: &mut SqliteConnection,
    assignment_id: i64,
    is_primary: bool,
    notes: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE professor_course_assignments SET is_primary = ?, notes = ? WHERE id = ?",
    )
    .bind(is_primary)
    .bind(notes)
    .bind(assignment_id)
    .execute(conn)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Assignment {} conflicts with an existing row", assignment_id))
        })
    })?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Assignment {}", assignment_id)));
    }
    Ok(())
}
