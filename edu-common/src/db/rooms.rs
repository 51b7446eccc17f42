//! Rooms

use crate::db::models::RoomType;
use crate::validation::{require_text, validate_capacity};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub code: String,
    pub name: String,
    #[serde(default = "default_room_type")]
    pub room_type: RoomType,
    pub capacity: i64,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub floor: i64,
}

fn default_room_type() -> RoomType {
    RoomType::Classroom
}

#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub room_type: RoomType,
    pub capacity: i64,
    pub building: String,
    pub floor: i64,
    pub is_active: bool,
}

pub async fn create_room(pool: &SqlitePool, room: &NewRoom) -> Result<i64> {
    require_text("Room code", &room.code)?;
    require_text("Room name", &room.name)?;
    validate_capacity(room.capacity)?;

    let result = sqlx::query(
        r#"
        INSERT INTO rooms (code, name, room_type, capacity, building, floor)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(room.code.trim())
    .bind(room.name.trim())
    .bind(room.room_type.code())
    .bind(room.capacity)
    .bind(&room.building)
    .bind(room.floor)
    .execute(pool)
    .await
    .map_err(|e| Error::on_unique_violation(e, || Error::Duplicate(format!("Room {}", room.code))))?;

    Ok(result.last_insert_rowid())
}

/// Take the write lock through the room row before checking its schedule
///
/// Returns false when the room does not exist.
pub async fn claim_room_row(conn: &mut SqliteConnection, room_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE rooms SET is_active = is_active WHERE id = ?")
        .bind(room_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn load_room<'e, E: SqliteExecutor<'e>>(exec: E, room_id: i64) -> Result<Room> {
    let row = sqlx::query(
        "SELECT id, code, name, room_type, capacity, building, floor, is_active FROM rooms WHERE id = ?",
    )
    .bind(room_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Room {}", room_id)))?;

    let room_type: String = row.get("room_type");
    Ok(Room {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        room_type: RoomType::from_code(&room_type)?,
        capacity: row.get("capacity"),
        building: row.get("building"),
        floor: row.get("floor"),
        is_active: row.get("is_active"),
    })
}
