//! Colleges, fields of study and specializations

use crate::validation::require_text;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, Deserialize)]
pub struct NewFieldOfStudy {
    pub college_id: i64,
    pub code: String,
    pub name: String,
    /// e.g. "کارشناسی", "کارشناسی ارشد"
    pub degree_level: String,
    pub total_credits: i64,
}

/// Field of study with its college
#[derive(Debug, Clone, Serialize)]
pub struct FieldOfStudy {
    pub id: i64,
    pub college_id: i64,
    pub college_name: String,
    pub code: String,
    pub name: String,
    pub degree_level: String,
    pub total_credits: i64,
}

pub async fn create_college(pool: &SqlitePool, code: &str, name: &str) -> Result<i64> {
    require_text("College code", code)?;
    require_text("College name", name)?;

    let result = sqlx::query("INSERT INTO colleges (code, name) VALUES (?, ?)")
        .bind(code.trim())
        .bind(name.trim())
        .execute(pool)
        .await
        .map_err(|e| Error::on_unique_violation(e, || Error::Duplicate(format!("College {}", code))))?;

    Ok(result.last_insert_rowid())
}

pub async fn create_field_of_study(pool: &SqlitePool, field: &NewFieldOfStudy) -> Result<i64> {
    require_text("Field code", &field.code)?;
    require_text("Field name", &field.name)?;
    require_text("Degree level", &field.degree_level)?;
    if field.total_credits <= 0 {
        return Err(Error::InvalidInput(format!(
            "Program total credits {} must be positive",
            field.total_credits
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO fields_of_study (college_id, code, name, degree_level, total_credits)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(field.college_id)
    .bind(field.code.trim())
    .bind(field.name.trim())
    .bind(field.degree_level.trim())
    .bind(field.total_credits)
    .execute(pool)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Field of study {} in college {}", field.code, field.college_id))
        })
    })?;

    Ok(result.last_insert_rowid())
}

pub async fn create_specialization(
    pool: &SqlitePool,
    field_of_study_id: i64,
    code: &str,
    name: &str,
) -> Result<i64> {
    require_text("Specialization code", code)?;
    require_text("Specialization name", name)?;

    let result = sqlx::query(
        "INSERT INTO specializations (field_of_study_id, code, name) VALUES (?, ?, ?)",
    )
    .bind(field_of_study_id)
    .bind(code.trim())
    .bind(name.trim())
    .execute(pool)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || Error::Duplicate(format!("Specialization {}", code)))
    })?;

    Ok(result.last_insert_rowid())
}

pub async fn load_field_of_study<'e, E: SqliteExecutor<'e>>(exec: E, id: i64) -> Result<FieldOfStudy> {
    let row = sqlx::query(
        r#"
        SELECT f.id, f.college_id, c.name AS college_name, f.code, f.name,
               f.degree_level, f.total_credits
        FROM fields_of_study f
        JOIN colleges c ON c.id = f.college_id
        WHERE f.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Field of study {}", id)))?;

    Ok(FieldOfStudy {
        id: row.get("id"),
        college_id: row.get("college_id"),
        college_name: row.get("college_name"),
        code: row.get("code"),
        name: row.get("name"),
        degree_level: row.get("degree_level"),
        total_credits: row.get("total_credits"),
    })
}
