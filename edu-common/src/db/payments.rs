//! Tuition payments

use crate::calendar::JalaliDate;
use crate::validation::validate_transaction_code;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub student_id: i64,
    #[serde(default)]
    pub term_id: Option<i64>,
    /// Rials
    pub amount: i64,
    /// Jalali `YYYY/MM/DD`
    pub payment_date: String,
    /// `online`, `card`, `cash`
    pub method: String,
    /// `pending`, `success`, `failed`
    pub status: String,
    pub transaction_code: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub student_id: i64,
    pub term_id: Option<i64>,
    pub amount: i64,
    pub payment_date: String,
    pub method: String,
    pub status: String,
    pub transaction_code: String,
    pub is_successful: bool,
}

pub async fn record_payment(pool: &SqlitePool, payment: &NewPayment) -> Result<i64> {
    if payment.amount <= 0 {
        return Err(Error::InvalidInput(format!(
            "Payment amount {} must be positive",
            payment.amount
        )));
    }
    validate_transaction_code(&payment.transaction_code)?;
    payment.payment_date.parse::<JalaliDate>()?;

    let method_id: i64 =
        sqlx::query_scalar("SELECT id FROM payment_methods WHERE code = ? AND is_active = 1")
            .bind(&payment.method)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                Error::InvalidInput(format!("Unknown payment method '{}'", payment.method))
            })?;

    let status_id: i64 = sqlx::query_scalar("SELECT id FROM payment_statuses WHERE code = ?")
        .bind(&payment.status)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("Unknown payment status '{}'", payment.status)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO tuition_payments (
            student_id, term_id, amount, payment_date, method_id, status_id,
            transaction_code, notes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payment.student_id)
    .bind(payment.term_id)
    .bind(payment.amount)
    .bind(&payment.payment_date)
    .bind(method_id)
    .bind(status_id)
    .bind(&payment.transaction_code)
    .bind(&payment.notes)
    .execute(pool)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!(
                "Transaction code {} already recorded",
                payment.transaction_code
            ))
        })
    })?;

    let id = result.last_insert_rowid();
    info!(payment_id = id, student_id = payment.student_id, amount = payment.amount, "Recorded payment");
    Ok(id)
}

/// Payments of a student, most recent first
pub async fn list_payments(pool: &SqlitePool, student_id: i64) -> Result<Vec<Payment>> {
    let rows = sqlx::query(
        r#"
        SELECT tp.id, tp.student_id, tp.term_id, tp.amount, tp.payment_date,
               pm.code AS method, ps.code AS status, tp.transaction_code, ps.is_successful
        FROM tuition_payments tp
        JOIN payment_methods pm ON pm.id = tp.method_id
        JOIN payment_statuses ps ON ps.id = tp.status_id
        WHERE tp.student_id = ?
        ORDER BY tp.payment_date DESC, tp.id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Payment {
            id: row.get("id"),
            student_id: row.get("student_id"),
            term_id: row.get("term_id"),
            amount: row.get("amount"),
            payment_date: row.get("payment_date"),
            method: row.get("method"),
            status: row.get("status"),
            transaction_code: row.get("transaction_code"),
            is_successful: row.get("is_successful"),
        })
        .collect())
}
