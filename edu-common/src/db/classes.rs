//! Class offerings
//!
//! Times are stored as zero-padded `HH:MM` text and parsed into
//! `NaiveTime` on load. Overlap rules are applied by the caller before
//! [`insert_class`] / [`update_class`]; this module only persists.

use crate::calendar::JalaliDate;
use crate::db::models::Weekday;
use crate::validation::{format_class_time, parse_class_time, require_text, validate_capacity};
use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};

/// Class as supplied on create or update
#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
    pub course_id: i64,
    pub term_id: i64,
    #[serde(default)]
    pub room_id: Option<i64>,
    pub class_code: String,
    pub day_of_week: Weekday,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub capacity: i64,
    /// Jalali `YYYY/MM/DD`
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

/// Validated class values ready to store
#[derive(Debug, Clone)]
pub struct ClassValues {
    pub course_id: i64,
    pub term_id: i64,
    pub room_id: Option<i64>,
    pub class_code: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i64,
    pub exam_date: Option<String>,
    pub is_active: bool,
}

impl NewClass {
    /// Parse times and check field ranges (start strictly before end)
    pub fn validate(&self) -> Result<ClassValues> {
        require_text("Class code", &self.class_code)?;
        validate_capacity(self.capacity)?;
        let start_time = parse_class_time(&self.start_time)?;
        let end_time = parse_class_time(&self.end_time)?;
        if start_time >= end_time {
            return Err(Error::InvalidInput(format!(
                "Class start {} must be before end {}",
                format_class_time(start_time),
                format_class_time(end_time)
            )));
        }
        if let Some(exam_date) = &self.exam_date {
            exam_date.parse::<JalaliDate>()?;
        }

        Ok(ClassValues {
            course_id: self.course_id,
            term_id: self.term_id,
            room_id: self.room_id,
            class_code: self.class_code.trim().to_string(),
            day_of_week: self.day_of_week,
            start_time,
            end_time,
            capacity: self.capacity,
            exam_date: self.exam_date.clone(),
            is_active: self.is_active,
        })
    }
}

/// Stored class
#[derive(Debug, Clone, Serialize)]
pub struct ClassRecord {
    pub id: i64,
    pub course_id: i64,
    pub term_id: i64,
    pub room_id: Option<i64>,
    pub class_code: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i64,
    pub exam_date: Option<String>,
    pub is_active: bool,
}

/// Class with the data shown in a course's class listing
#[derive(Debug, Clone)]
pub struct ClassListing {
    pub class: ClassRecord,
    pub room_code: Option<String>,
    pub master_name: Option<String>,
    pub registered: i64,
}

macro_rules! class_columns {
    ($alias:literal) => {
        concat!(
            $alias, ".id, ", $alias, ".course_id, ", $alias, ".term_id, ", $alias, ".room_id, ",
            $alias, ".class_code, ", $alias, ".day_of_week, ", $alias, ".start_time, ",
            $alias, ".end_time, ", $alias, ".capacity, ", $alias, ".exam_date, ",
            $alias, ".is_active"
        )
    };
}
pub(crate) use class_columns;

pub(crate) fn class_from_row(row: &SqliteRow) -> Result<ClassRecord> {
    let day: String = row.get("day_of_week");
    let start: String = row.get("start_time");
    let end: String = row.get("end_time");

    Ok(ClassRecord {
        id: row.get("id"),
        course_id: row.get("course_id"),
        term_id: row.get("term_id"),
        room_id: row.get("room_id"),
        class_code: row.get("class_code"),
        day_of_week: Weekday::from_code(&day)?,
        start_time: parse_class_time(&start)?,
        end_time: parse_class_time(&end)?,
        capacity: row.get("capacity"),
        exam_date: row.get("exam_date"),
        is_active: row.get("is_active"),
    })
}

fn duplicate_code(values: &ClassValues) -> impl FnOnce() -> Error + '_ {
    move || {
        Error::Duplicate(format!(
            "Class code {} already exists in term {}",
            values.class_code, values.term_id
        ))
    }
}

pub async fn insert_class(conn: &mut SqliteConnection, values: &ClassValues) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO classes (
            course_id, term_id, room_id, class_code, day_of_week,
            start_time, end_time, capacity, exam_date, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(values.course_id)
    .bind(values.term_id)
    .bind(values.room_id)
    .bind(&values.class_code)
    .bind(values.day_of_week.code())
    .bind(format_class_time(values.start_time))
    .bind(format_class_time(values.end_time))
    .bind(values.capacity)
    .bind(&values.exam_date)
    .bind(values.is_active)
    .execute(conn)
    .await
    .map_err(|e| Error::on_unique_violation(e, duplicate_code(values)))?;

    Ok(result.last_insert_rowid())
}

pub async fn update_class(
    conn: &mut SqliteConnection,
    class_id: i64,
    values: &ClassValues,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE classes SET
            course_id = ?, term_id = ?, room_id = ?, class_code = ?, day_of_week = ?,
            start_time = ?, end_time = ?, capacity = ?, exam_date = ?, is_active = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(values.course_id)
    .bind(values.term_id)
    .bind(values.room_id)
    .bind(&values.class_code)
    .bind(values.day_of_week.code())
    .bind(format_class_time(values.start_time))
    .bind(format_class_time(values.end_time))
    .bind(values.capacity)
    .bind(&values.exam_date)
    .bind(values.is_active)
    .bind(class_id)
    .execute(conn)
    .await
    .map_err(|e| Error::on_unique_violation(e, duplicate_code(values)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Class {}", class_id)));
    }
    Ok(())
}

/// Take the database write lock through the class row
///
/// Must be the first statement of a registration or assignment transaction:
/// SQLite then serializes concurrent writers on it before any check reads.
/// Returns false when the class does not exist.
pub async fn claim_class_row(conn: &mut SqliteConnection, class_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE classes SET updated_at = updated_at WHERE id = ?")
        .bind(class_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn load_class<'e, E: SqliteExecutor<'e>>(exec: E, class_id: i64) -> Result<ClassRecord> {
    let row = sqlx::query(concat!(
        "SELECT ",
        class_columns!("c"),
        " FROM classes c WHERE c.id = ?"
    ))
    .bind(class_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Class {}", class_id)))?;

    class_from_row(&row)
}

/// Registered-count: registrations holding a seat (registered, passed, failed)
pub async fn seat_count<'e, E: SqliteExecutor<'e>>(exec: E, class_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM student_class_registrations WHERE class_id = ? AND status IN ('R', 'P', 'F')",
    )
    .bind(class_id)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

/// Active classes sharing room, term and weekday, except `exclude_id`
pub async fn room_slot_peers(
    conn: &mut SqliteConnection,
    room_id: i64,
    term_id: i64,
    day: Weekday,
    exclude_id: Option<i64>,
) -> Result<Vec<ClassRecord>> {
    let rows = sqlx::query(concat!(
        "SELECT ",
        class_columns!("c"),
        " FROM classes c \
         WHERE c.room_id = ? AND c.term_id = ? AND c.day_of_week = ? AND c.is_active = 1 \
           AND c.id <> ? \
         ORDER BY c.start_time"
    ))
    .bind(room_id)
    .bind(term_id)
    .bind(day.code())
    .bind(exclude_id.unwrap_or(-1))
    .fetch_all(conn)
    .await?;

    rows.iter().map(class_from_row).collect()
}

/// Active classes of a course with room, primary instructor and seat count
///
/// `term_id = None` lists every term.
pub async fn list_course_classes(
    pool: &SqlitePool,
    course_id: i64,
    term_id: Option<i64>,
) -> Result<Vec<ClassListing>> {
    let rows = sqlx::query(concat!(
        "SELECT ",
        class_columns!("c"),
        r#", r.code AS room_code,
            (SELECT COUNT(*) FROM student_class_registrations s
              WHERE s.class_id = c.id AND s.status IN ('R', 'P', 'F')) AS registered,
            (SELECT p.first_name || ' ' || p.last_name
               FROM professor_course_assignments a
               JOIN professors pr ON pr.id = a.professor_id
               JOIN persons p ON p.id = pr.person_id
              WHERE a.class_id = c.id AND a.is_primary = 1) AS master_name
        FROM classes c
        LEFT JOIN rooms r ON r.id = c.room_id
        WHERE c.course_id = ? AND c.is_active = 1 AND (? IS NULL OR c.term_id = ?)
        ORDER BY c.class_code, c.id"#
    ))
    .bind(course_id)
    .bind(term_id)
    .bind(term_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ClassListing {
                class: class_from_row(row)?,
                room_code: row.get("room_code"),
                master_name: row.get("master_name"),
                registered: row.get("registered"),
            })
        })
        .collect()
}
