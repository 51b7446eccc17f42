//! Student records

use crate::api::auth::hash_password;
use crate::db::models::AcademicStatus;
use crate::db::persons::{insert_person, person_columns, person_from_row, NewPerson, Person};
use crate::validation::{validate_email, validate_student_number};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use tracing::info;

/// Student as supplied by the admin API
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    #[serde(flatten)]
    pub person: NewPerson,
    pub student_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub field_of_study_id: Option<i64>,
    #[serde(default)]
    pub specialization_id: Option<i64>,
    #[serde(default)]
    pub entry_term_code: Option<String>,
    /// Login password; without one the student cannot log in
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: i64,
    pub person: Person,
    pub student_number: String,
    pub email: Option<String>,
    pub field_of_study_id: Option<i64>,
    pub specialization_id: Option<i64>,
    pub entry_term_code: Option<String>,
    pub enrollment_date: String,
    pub academic_status: AcademicStatus,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.academic_status == AcademicStatus::Active
    }
}

/// Stored password material for login
#[derive(Debug, Clone)]
pub struct StudentCredentials {
    pub student_id: i64,
    pub password_hash: String,
    pub password_salt: String,
}

macro_rules! student_select {
    ($where:literal) => {
        concat!(
            "SELECT s.id, s.person_id, s.student_number, s.email, s.field_of_study_id, \
             s.specialization_id, s.entry_term_code, s.enrollment_date, s.academic_status, ",
            person_columns!(),
            " FROM students s JOIN persons p ON p.id = s.person_id ",
            $where
        )
    };
}

fn student_from_row(row: &SqliteRow) -> Result<Student> {
    let status: String = row.get("academic_status");
    Ok(Student {
        id: row.get("id"),
        person: person_from_row(row)?,
        student_number: row.get("student_number"),
        email: row.get("email"),
        field_of_study_id: row.get("field_of_study_id"),
        specialization_id: row.get("specialization_id"),
        entry_term_code: row.get("entry_term_code"),
        enrollment_date: row.get("enrollment_date"),
        academic_status: AcademicStatus::from_code(&status)?,
    })
}

/// Create the person and student rows in one transaction
///
/// The enrollment date is set here and never updated afterwards.
pub async fn create_student(pool: &SqlitePool, student: &NewStudent) -> Result<i64> {
    validate_student_number(&student.student_number)?;
    if let Some(email) = &student.email {
        validate_email(email)?;
    }
    let (hash, salt) = match &student.password {
        Some(password) if !password.is_empty() => hash_password(password),
        Some(_) => return Err(Error::InvalidInput("Password must not be empty".to_string())),
        None => (String::new(), String::new()),
    };

    let mut tx = pool.begin().await?;
    let person_id = insert_person(&mut tx, &student.person).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO students (
            person_id, student_number, email, field_of_study_id, specialization_id,
            entry_term_code, password_hash, password_salt
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(person_id)
    .bind(&student.student_number)
    .bind(&student.email)
    .bind(student.field_of_study_id)
    .bind(student.specialization_id)
    .bind(&student.entry_term_code)
    .bind(&hash)
    .bind(&salt)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Student number {} is taken", student.student_number))
        })
    })?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(student_id = id, student_number = %student.student_number, "Created student");
    Ok(id)
}

pub async fn load_student<'e, E: SqliteExecutor<'e>>(exec: E, student_id: i64) -> Result<Student> {
    let row = sqlx::query(student_select!("WHERE s.id = ?"))
        .bind(student_id)
        .fetch_optional(exec)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Student {}", student_id)))?;

    student_from_row(&row)
}

pub async fn find_student_by_number<'e, E: SqliteExecutor<'e>>(
    exec: E,
    student_number: &str,
) -> Result<Option<Student>> {
    let row = sqlx::query(student_select!("WHERE s.student_number = ?"))
        .bind(student_number)
        .fetch_optional(exec)
        .await?;

    row.as_ref().map(student_from_row).transpose()
}

pub async fn load_credentials(
    pool: &SqlitePool,
    student_number: &str,
) -> Result<Option<StudentCredentials>> {
    let row = sqlx::query(
        "SELECT id, password_hash, password_salt FROM students WHERE student_number = ?",
    )
    .bind(student_number)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| StudentCredentials {
        student_id: row.get("id"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
    }))
}

pub async fn set_password(pool: &SqlitePool, student_id: i64, password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password must not be empty".to_string()));
    }
    let (hash, salt) = hash_password(password);

    let result = sqlx::query(
        "UPDATE students SET password_hash = ?, password_salt = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(hash)
    .bind(salt)
    .bind(student_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Student {}", student_id)));
    }
    Ok(())
}

pub async fn set_academic_status(
    pool: &SqlitePool,
    student_id: i64,
    status: AcademicStatus,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE students SET academic_status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(status.code())
    .bind(student_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Student {}", student_id)));
    }
    info!(student_id, status = %status, "Updated academic status");
    Ok(())
}
