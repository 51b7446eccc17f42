//! Professor records

use crate::calendar::{self, JalaliDate};
use crate::db::models::ProfessorContract;
use crate::db::persons::{insert_person, person_columns, person_from_row, NewPerson, Person};
use crate::validation::require_text;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfessor {
    #[serde(flatten)]
    pub person: NewPerson,
    pub professor_code: String,
    #[serde(default)]
    pub employee_number: Option<String>,
    #[serde(default = "default_contract")]
    pub contract_type: ProfessorContract,
    /// Jalali `YYYY/MM/DD`
    pub hire_date: String,
    #[serde(default)]
    pub expertise: Option<String>,
}

fn default_contract() -> ProfessorContract {
    ProfessorContract::FullTime
}

#[derive(Debug, Clone, Serialize)]
pub struct Professor {
    pub id: i64,
    pub person: Person,
    pub professor_code: String,
    pub employee_number: Option<String>,
    pub contract_type: ProfessorContract,
    pub hire_date: String,
    pub expertise: Option<String>,
    pub is_active: bool,
}

impl Professor {
    /// Whole years since hire, `None` if the stored date does not parse
    pub fn teaching_experience_years(&self) -> Option<i32> {
        calendar::years_since(&self.hire_date)
    }
}

fn professor_from_row(row: &SqliteRow) -> Result<Professor> {
    let contract: String = row.get("contract_type");
    Ok(Professor {
        id: row.get("id"),
        person: person_from_row(row)?,
        professor_code: row.get("professor_code"),
        employee_number: row.get("employee_number"),
        contract_type: ProfessorContract::from_code(&contract)?,
        hire_date: row.get("hire_date"),
        expertise: row.get("expertise"),
        is_active: row.get("is_active"),
    })
}

pub async fn create_professor(pool: &SqlitePool, professor: &NewProfessor) -> Result<i64> {
    require_text("Professor code", &professor.professor_code)?;
    professor.hire_date.parse::<JalaliDate>()?;

    let mut tx = pool.begin().await?;
    let person_id = insert_person(&mut tx, &professor.person).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO professors (
            person_id, professor_code, employee_number, contract_type, hire_date, expertise
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(person_id)
    .bind(professor.professor_code.trim())
    .bind(&professor.employee_number)
    .bind(professor.contract_type.code())
    .bind(&professor.hire_date)
    .bind(&professor.expertise)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!(
                "Professor code {} or employee number is taken",
                professor.professor_code
            ))
        })
    })?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(professor_id = id, code = %professor.professor_code, "Created professor");
    Ok(id)
}

pub async fn load_professor<'e, E: SqliteExecutor<'e>>(exec: E, professor_id: i64) -> Result<Professor> {
    let row = sqlx::query(concat!(
        "SELECT pr.id, pr.person_id, pr.professor_code, pr.employee_number, pr.contract_type, \
         pr.hire_date, pr.expertise, pr.is_active, ",
        person_columns!(),
        " FROM professors pr JOIN persons p ON p.id = pr.person_id WHERE pr.id = ?"
    ))
    .bind(professor_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Professor {}", professor_id)))?;

    professor_from_row(&row)
}

/// Assignments of the professor to classes of the current term
pub async fn current_assignment_count(pool: &SqlitePool, professor_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM professor_course_assignments a
        JOIN classes c ON c.id = a.class_id
        JOIN terms t ON t.id = c.term_id
        WHERE a.professor_id = ? AND t.is_current = 1
        "#,
    )
    .bind(professor_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
