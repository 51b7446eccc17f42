//! Course catalog and course requisites

use crate::validation::{require_text, validate_credits};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::info;

/// Prerequisite or corequisite link supplied on course creation
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RequisiteLink {
    pub course_id: i64,
    #[serde(default = "mandatory")]
    pub is_mandatory: bool,
}

fn mandatory() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub field_of_study_id: i64,
    pub code: String,
    pub name: String,
    pub credits: i64,
    #[serde(default = "default_course_type")]
    pub course_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<RequisiteLink>,
    #[serde(default)]
    pub corequisites: Vec<RequisiteLink>,
}

fn default_course_type() -> String {
    "theory".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: i64,
    pub field_of_study_id: i64,
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub course_type: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Which requisite relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequisiteKind {
    Prerequisite,
    Corequisite,
}

/// A course required by another course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requisite {
    pub course_id: i64,
    pub code: String,
    pub is_mandatory: bool,
}

fn course_from_row(row: &SqliteRow) -> Course {
    Course {
        id: row.get("id"),
        field_of_study_id: row.get("field_of_study_id"),
        code: row.get("code"),
        name: row.get("name"),
        credits: row.get("credits"),
        course_type: row.get("course_type"),
        description: row.get("description"),
        is_active: row.get("is_active"),
    }
}

/// Create a course together with its requisite links
pub async fn create_course(pool: &SqlitePool, course: &NewCourse) -> Result<i64> {
    require_text("Course code", &course.code)?;
    require_text("Course name", &course.name)?;
    validate_credits(course.credits)?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO courses (field_of_study_id, code, name, credits, course_type, description)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(course.field_of_study_id)
    .bind(course.code.trim())
    .bind(course.name.trim())
    .bind(course.credits)
    .bind(&course.course_type)
    .bind(&course.description)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!(
                "Course {} in field {}",
                course.code, course.field_of_study_id
            ))
        })
    })?;
    let course_id = result.last_insert_rowid();

    for link in &course.prerequisites {
        insert_requisite(&mut tx, RequisiteKind::Prerequisite, course_id, link).await?;
    }
    for link in &course.corequisites {
        insert_requisite(&mut tx, RequisiteKind::Corequisite, course_id, link).await?;
    }

    tx.commit().await?;
    info!(course_id, code = %course.code, "Created course");
    Ok(course_id)
}

/// Link an existing course to a requisite; a course cannot require itself
pub async fn add_requisite(
    pool: &SqlitePool,
    kind: RequisiteKind,
    course_id: i64,
    link: &RequisiteLink,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    insert_requisite(&mut conn, kind, course_id, link).await
}

async fn insert_requisite(
    conn: &mut SqliteConnection,
    kind: RequisiteKind,
    course_id: i64,
    link: &RequisiteLink,
) -> Result<()> {
    if link.course_id == course_id {
        return Err(Error::InvalidInput(format!(
            "Course {} cannot require itself",
            course_id
        )));
    }

    let sql = match kind {
        RequisiteKind::Prerequisite => {
            "INSERT INTO course_prerequisites (course_id, prerequisite_course_id, is_mandatory) VALUES (?, ?, ?)"
        }
        RequisiteKind::Corequisite => {
            "INSERT INTO course_corequisites (course_id, corequisite_course_id, is_mandatory) VALUES (?, ?, ?)"
        }
    };

    sqlx::query(sql)
        .bind(course_id)
        .bind(link.course_id)
        .bind(link.is_mandatory)
        .execute(conn)
        .await
        .map_err(|e| {
            Error::on_unique_violation(e, || {
                Error::Duplicate(format!(
                    "Course {} already lists course {}",
                    course_id, link.course_id
                ))
            })
        })?;

    Ok(())
}

pub async fn load_course<'e, E: SqliteExecutor<'e>>(exec: E, course_id: i64) -> Result<Course> {
    let row = sqlx::query(
        r#"
        SELECT id, field_of_study_id, code, name, credits, course_type, description, is_active
        FROM courses WHERE id = ?
        "#,
    )
    .bind(course_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Course {}", course_id)))?;

    Ok(course_from_row(&row))
}

/// Requisites of a course, mandatory ones first
pub async fn requisites<'e, E: SqliteExecutor<'e>>(
    exec: E,
    kind: RequisiteKind,
    course_id: i64,
) -> Result<Vec<Requisite>> {
    let sql = match kind {
        RequisiteKind::Prerequisite => {
            r#"
            SELECT c.id, c.code, r.is_mandatory
            FROM course_prerequisites r JOIN courses c ON c.id = r.prerequisite_course_id
            WHERE r.course_id = ?
            ORDER BY r.is_mandatory DESC, c.code
            "#
        }
        RequisiteKind::Corequisite => {
            r#"
            SELECT c.id, c.code, r.is_mandatory
            FROM course_corequisites r JOIN courses c ON c.id = r.corequisite_course_id
            WHERE r.course_id = ?
            ORDER BY r.is_mandatory DESC, c.code
            "#
        }
    };

    let rows = sqlx::query(sql).bind(course_id).fetch_all(exec).await?;

    Ok(rows
        .iter()
        .map(|row| Requisite {
            course_id: row.get("id"),
            code: row.get("code"),
            is_mandatory: row.get("is_mandatory"),
        })
        .collect())
}

/// The active catalog, by name
pub async fn active_courses(pool: &SqlitePool) -> Result<Vec<Course>> {
    let rows = sqlx::query(
        r#"
        SELECT co.id, co.field_of_study_id, co.code, co.name, co.credits,
               co.course_type, co.description, co.is_active
        FROM courses co
        WHERE co.is_active = 1
        ORDER BY co.name, co.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(course_from_row).collect())
}
