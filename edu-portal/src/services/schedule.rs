//! Class creation and update with the room time-conflict check

use edu_common::db::classes::{
    claim_class_row, insert_class, room_slot_peers, seat_count, update_class as store_class,
    ClassValues, NewClass,
};
use edu_common::db::courses::load_course;
use edu_common::db::rooms::{claim_room_row, load_room};
use edu_common::db::terms::load_term;
use edu_common::validation::{format_class_time, intervals_overlap};
use edu_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

/// Reject the class if it overlaps another active class in the same room slot
///
/// Two classes conflict when they share room, term and weekday and their
/// `[start, end)` intervals intersect. Inactive classes and classes without
/// a room are never checked.
pub async fn check_room_conflict(
    conn: &mut SqliteConnection,
    values: &ClassValues,
    class_id: Option<i64>,
) -> Result<()> {
    let room_id = match values.room_id {
        Some(room_id) if values.is_active => room_id,
        _ => return Ok(()),
    };

    let peers = room_slot_peers(conn, room_id, values.term_id, values.day_of_week, class_id).await?;
    let conflict = peers.iter().find(|peer| {
        intervals_overlap(values.start_time, values.end_time, peer.start_time, peer.end_time)
    });

    if let Some(peer) = conflict {
        let room = load_room(&mut *conn, room_id).await?;
        return Err(Error::ScheduleConflict {
            conflicting_class: format!(
                "{} ({}-{})",
                peer.class_code,
                format_class_time(peer.start_time),
                format_class_time(peer.end_time)
            ),
            room_code: room.code,
        });
    }

    Ok(())
}

/// Referenced course and term must exist
async fn check_references(conn: &mut SqliteConnection, values: &ClassValues) -> Result<()> {
    load_course(&mut *conn, values.course_id).await?;
    load_term(&mut *conn, values.term_id).await?;
    Ok(())
}

pub async fn create_class(pool: &SqlitePool, class: &NewClass) -> Result<i64> {
    let values = class.validate()?;

    let mut tx = pool.begin().await?;
    if let Some(room_id) = values.room_id {
        if !claim_room_row(&mut tx, room_id).await? {
            return Err(Error::NotFound(format!("Room {}", room_id)));
        }
    }
    check_references(&mut tx, &values).await?;
    check_room_conflict(&mut tx, &values, None).await?;
    let class_id = insert_class(&mut tx, &values).await?;
    tx.commit().await?;

    info!(
        class_id,
        class_code = %values.class_code,
        day = %values.day_of_week,
        start = %format_class_time(values.start_time),
        end = %format_class_time(values.end_time),
        "Created class"
    );
    Ok(class_id)
}

pub async fn update_class(pool: &SqlitePool, class_id: i64, class: &NewClass) -> Result<()> {
    let values = class.validate()?;

    let mut tx = pool.begin().await?;
    if !claim_class_row(&mut tx, class_id).await? {
        return Err(Error::NotFound(format!("Class {}", class_id)));
    }
    if let Some(room_id) = values.room_id {
        // Only existence matters here; the class row already holds the lock
        load_room(&mut *tx, room_id).await?;
    }
    check_references(&mut tx, &values).await?;
    check_room_conflict(&mut tx, &values, Some(class_id)).await?;

    // Capacity may not drop below the seats already taken
    let taken = seat_count(&mut *tx, class_id).await?;
    if taken > values.capacity {
        return Err(Error::InvalidInput(format!(
            "Capacity {} is below the {} seats already taken",
            values.capacity, taken
        )));
    }

    store_class(&mut tx, class_id, &values).await?;
    tx.commit().await?;

    info!(class_id, class_code = %values.class_code, capacity = values.capacity, "Updated class");
    Ok(())
}
