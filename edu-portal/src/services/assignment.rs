//! Primary-instructor assignment guard
//!
//! A class has at most one primary instructor. Setting `is_primary` on a
//! new or existing assignment fails with `DuplicatePrimary` while another
//! assignment of the class is primary; the existing primary is kept.

use edu_common::db::assignments::{
    claim_assignment_row, find_assignment, find_other_primary, insert_assignment,
    load_assignment, update_assignment as store_assignment, Assignment,
};
use edu_common::db::classes::{claim_class_row, load_class};
use edu_common::db::professors::load_professor;
use edu_common::{Error, Result};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub professor_id: i64,
    pub class_id: i64,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentChange {
    pub is_primary: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

async fn ensure_no_other_primary(
    conn: &mut SqliteConnection,
    class_id: i64,
    exclude_id: Option<i64>,
) -> Result<()> {
    if find_other_primary(conn, class_id, exclude_id).await?.is_some() {
        let class = load_class(&mut *conn, class_id).await?;
        return Err(Error::DuplicatePrimary {
            class_code: class.class_code,
        });
    }
    Ok(())
}

pub async fn assign_professor(pool: &SqlitePool, assignment: &NewAssignment) -> Result<Assignment> {
    let mut tx = pool.begin().await?;

    if !claim_class_row(&mut tx, assignment.class_id).await? {
        return Err(Error::NotFound(format!("Class {}", assignment.class_id)));
    }
    load_professor(&mut *tx, assignment.professor_id).await?;

    if find_assignment(&mut tx, assignment.professor_id, assignment.class_id)
        .await?
        .is_some()
    {
        return Err(Error::Duplicate(format!(
            "Professor {} is already assigned to class {}",
            assignment.professor_id, assignment.class_id
        )));
    }
    if assignment.is_primary {
        ensure_no_other_primary(&mut tx, assignment.class_id, None).await?;
    }

    let id = insert_assignment(
        &mut tx,
        assignment.professor_id,
        assignment.class_id,
        assignment.is_primary,
        assignment.notes.as_deref(),
    )
    .await?;
    let created = load_assignment(&mut tx, id).await?;
    tx.commit().await?;

    info!(
        assignment_id = id,
        professor_id = assignment.professor_id,
        class_id = assignment.class_id,
        primary = assignment.is_primary,
        "Assigned professor"
    );
    Ok(created)
}

pub async fn update_assignment(
    pool: &SqlitePool,
    assignment_id: i64,
    change: &AssignmentChange,
) -> Result<Assignment> {
    let mut tx = pool.begin().await?;

    if !claim_assignment_row(&mut tx, assignment_id).await? {
        return Err(Error::NotFound(format!("Assignment {}", assignment_id)));
    }
    let current = load_assignment(&mut tx, assignment_id).await?;

    if change.is_primary {
        ensure_no_other_primary(&mut tx, current.class_id, Some(assignment_id)).await?;
    }

    store_assignment(&mut tx, assignment_id, change.is_primary, change.notes.as_deref()).await?;
    let updated = load_assignment(&mut tx, assignment_id).await?;
    tx.commit().await?;

    info!(assignment_id, class_id = updated.class_id, primary = updated.is_primary, "Updated assignment");
    Ok(updated)
}
