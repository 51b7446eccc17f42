//! Countries, provinces and cities (birth places)

use crate::validation::require_text;
use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Serialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub province: String,
    pub country: String,
}

pub async fn create_country(pool: &SqlitePool, name: &str, code: &str) -> Result<i64> {
    require_text("Country name", name)?;
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidInput(format!(
            "Country code '{}' must be 3 letters",
            code
        )));
    }

    let result = sqlx::query("INSERT INTO countries (name, code) VALUES (?, ?)")
        .bind(name.trim())
        .bind(code.to_ascii_uppercase())
        .execute(pool)
        .await
        .map_err(|e| Error::on_unique_violation(e, || Error::Duplicate(format!("Country {}", name))))?;

    Ok(result.last_insert_rowid())
}

pub async fn create_province(pool: &SqlitePool, country_id: i64, name: &str) -> Result<i64> {
    require_text("Province name", name)?;

    let result = sqlx::query("INSERT INTO provinces (country_id, name) VALUES (?, ?)")
        .bind(country_id)
        .bind(name.trim())
        .execute(pool)
        .await
        .map_err(|e| {
            Error::on_unique_violation(e, || Error::Duplicate(format!("Province {}", name)))
        })?;

    Ok(result.last_insert_rowid())
}

pub async fn create_city(pool: &SqlitePool, province_id: i64, name: &str) -> Result<i64> {
    require_text("City name", name)?;

    let result = sqlx::query("INSERT INTO cities (province_id, name) VALUES (?, ?)")
        .bind(province_id)
        .bind(name.trim())
        .execute(pool)
        .await
        .map_err(|e| Error::on_unique_violation(e, || Error::Duplicate(format!("City {}", name))))?;

    Ok(result.last_insert_rowid())
}

/// City with its province and country names
pub async fn load_city(pool: &SqlitePool, city_id: i64) -> Result<City> {
    let row = sqlx::query(
        r#"
        SELECT ci.id, ci.name, p.name AS province, co.name AS country
        FROM cities ci
        JOIN provinces p ON p.id = ci.province_id
        JOIN countries co ON co.id = p.country_id
        WHERE ci.id = ?
        "#,
    )
    .bind(city_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("City {}", city_id)))?;

    Ok(City {
        id: row.get("id"),
        name: row.get("name"),
        province: row.get("province"),
        country: row.get("country"),
    })
}
