//! Academic terms
//!
//! At most one term is current: marking a term current clears the flag on
//! every other term in the same transaction.

use crate::calendar::JalaliDate;
use crate::validation::require_text;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTerm {
    pub code: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_registration_open: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Term {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub is_registration_open: bool,
}

macro_rules! term_select {
    ($tail:literal) => {
        concat!(
            "SELECT id, code, name, start_date, end_date, is_current, is_registration_open FROM terms ",
            $tail
        )
    };
}

fn term_from_row(row: &SqliteRow) -> Term {
    Term {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_current: row.get("is_current"),
        is_registration_open: row.get("is_registration_open"),
    }
}

/// Start must be strictly before end
pub fn validate_term_dates(start_date: &str, end_date: &str) -> Result<()> {
    let start: JalaliDate = start_date.parse()?;
    let end: JalaliDate = end_date.parse()?;
    if start >= end {
        return Err(Error::InvalidInput(format!(
            "Term start {} must be before end {}",
            start, end
        )));
    }
    Ok(())
}

pub async fn create_term(pool: &SqlitePool, term: &NewTerm) -> Result<i64> {
    require_text("Term code", &term.code)?;
    require_text("Term name", &term.name)?;
    validate_term_dates(&term.start_date, &term.end_date)?;

    let mut tx = pool.begin().await?;

    if term.is_current {
        clear_current(&mut tx).await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO terms (code, name, start_date, end_date, is_current, is_registration_open)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(term.code.trim())
    .bind(term.name.trim())
    .bind(&term.start_date)
    .bind(&term.end_date)
    .bind(term.is_current)
    .bind(term.is_registration_open)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::on_unique_violation(e, || Error::Duplicate(format!("Term {}", term.code))))?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(term_id = id, code = %term.code, current = term.is_current, "Created term");
    Ok(id)
}

async fn clear_current(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("UPDATE terms SET is_current = 0 WHERE is_current = 1")
        .execute(conn)
        .await?;
    Ok(())
}

/// Make `term_id` the only current term
pub async fn set_current_term(pool: &SqlitePool, term_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    clear_current(&mut tx).await?;

    let result = sqlx::query("UPDATE terms SET is_current = 1 WHERE id = ?")
        .bind(term_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        // Dropping the transaction rolls back the cleared flags
        return Err(Error::NotFound(format!("Term {}", term_id)));
    }

    tx.commit().await?;
    info!(term_id, "Marked term as current");
    Ok(())
}

pub async fn set_registration_open(pool: &SqlitePool, term_id: i64, open: bool) -> Result<()> {
    let result = sqlx::query("UPDATE terms SET is_registration_open = ? WHERE id = ?")
        .bind(open)
        .bind(term_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Term {}", term_id)));
    }
    info!(term_id, open, "Changed registration window");
    Ok(())
}

pub async fn load_term<'e, E: SqliteExecutor<'e>>(exec: E, term_id: i64) -> Result<Term> {
    let row = sqlx::query(term_select!("WHERE id = ?"))
        .bind(term_id)
        .fetch_optional(exec)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Term {}", term_id)))?;
    Ok(term_from_row(&row))
}

pub async fn find_term_by_code<'e, E: SqliteExecutor<'e>>(exec: E, code: &str) -> Result<Option<Term>> {
    let row = sqlx::query(term_select!("WHERE code = ?"))
        .bind(code)
        .fetch_optional(exec)
        .await?;
    Ok(row.as_ref().map(term_from_row))
}

pub async fn current_term<'e, E: SqliteExecutor<'e>>(exec: E) -> Result<Option<Term>> {
    let row = sqlx::query(term_select!("WHERE is_current = 1 ORDER BY id DESC LIMIT 1"))
        .fetch_optional(exec)
        .await?;
    Ok(row.as_ref().map(term_from_row))
}
