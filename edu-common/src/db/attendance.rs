//! Class attendance

use crate::db::classes::load_class;
use crate::validation::validate_attendance_window;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Storage format of `attendance_time`
const ATTENDANCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub student_id: i64,
    pub class_id: i64,
    pub attendance_time: NaiveDateTime,
    /// `manual`, `qr`, `card`
    pub method: String,
    #[serde(default)]
    pub is_approved_by_professor: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub attendance_time: String,
    pub method: String,
    pub is_approved_by_professor: bool,
    pub notes: Option<String>,
}

/// Record attendance; the time of day must fall inside the class window
pub async fn record_attendance(pool: &SqlitePool, attendance: &NewAttendance) -> Result<i64> {
    let class = load_class(pool, attendance.class_id).await?;
    validate_attendance_window(
        attendance.attendance_time.time(),
        class.start_time,
        class.end_time,
    )?;

    let method_id: i64 =
        sqlx::query_scalar("SELECT id FROM attendance_methods WHERE code = ? AND is_active = 1")
            .bind(&attendance.method)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                Error::InvalidInput(format!("Unknown attendance method '{}'", attendance.method))
            })?;

    let registered: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM student_class_registrations WHERE student_id = ? AND class_id = ?)",
    )
    .bind(attendance.student_id)
    .bind(attendance.class_id)
    .fetch_one(pool)
    .await?;
    if !registered {
        return Err(Error::NotFound(format!(
            "Registration of student {} in class {}",
            attendance.student_id, attendance.class_id
        )));
    }

    let time = attendance.attendance_time.format(ATTENDANCE_FORMAT).to_string();
    let result = sqlx::query(
        r#"
        INSERT INTO class_attendance (
            student_id, class_id, attendance_time, method_id, is_approved_by_professor, notes
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(attendance.student_id)
    .bind(attendance.class_id)
    .bind(&time)
    .bind(method_id)
    .bind(attendance.is_approved_by_professor)
    .bind(&attendance.notes)
    .execute(pool)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Attendance at {} already recorded", time))
        })
    })?;

    Ok(result.last_insert_rowid())
}

/// Attendance of a student in a class, most recent first
pub async fn list_attendance(
    pool: &SqlitePool,
    student_id: i64,
    class_id: i64,
) -> Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.student_id, a.class_id, a.attendance_time, m.code AS method,
               a.is_approved_by_professor, a.notes
        FROM class_attendance a
        JOIN attendance_methods m ON m.id = a.method_id
        WHERE a.student_id = ? AND a.class_id = ?
        ORDER BY a.attendance_time DESC
        "#,
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| AttendanceRecord {
            id: row.get("id"),
            student_id: row.get("student_id"),
            class_id: row.get("class_id"),
            attendance_time: row.get("attendance_time"),
            method: row.get("method"),
            is_approved_by_professor: row.get("is_approved_by_professor"),
            notes: row.get("notes"),
        })
        .collect())
}
