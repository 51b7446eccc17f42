//! Person records shared by students, professors and staff
//!
//! Every role row references one `persons` row. Identity validation
//! (national id checksum, Jalali birth date) happens here and nowhere else.

use crate::calendar::{self, JalaliDate};
use crate::db::models::{Gender, MaritalStatus, MilitaryStatus};
use crate::validation::{require_text, validate_national_id};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Person attributes supplied on creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub father_name: String,
    pub national_id: String,
    #[serde(default)]
    pub id_number: Option<String>,
    /// Jalali `YYYY/MM/DD`
    pub birth_date: String,
    #[serde(default)]
    pub birth_city_id: Option<i64>,
    pub gender: Gender,
    #[serde(default = "default_marital_status")]
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub military_status: Option<MilitaryStatus>,
    #[serde(default)]
    pub address: Option<String>,
}

fn default_marital_status() -> MaritalStatus {
    MaritalStatus::Single
}

/// Stored person
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub national_id: String,
    pub id_number: Option<String>,
    pub birth_date: String,
    pub birth_city_id: Option<i64>,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    pub military_status: Option<MilitaryStatus>,
    pub address: Option<String>,
}

impl NewPerson {
    /// Check identity fields before insert
    pub fn validate(&self) -> Result<()> {
        require_text("First name", &self.first_name)?;
        require_text("Last name", &self.last_name)?;
        validate_national_id(&self.national_id)?;
        self.birth_date.parse::<JalaliDate>()?;
        Ok(())
    }
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whole years since birth, `None` if the stored date does not parse
    pub fn age(&self) -> Option<i32> {
        calendar::years_since(&self.birth_date)
    }
}

/// Columns selected for a person, prefixed with `p.`
macro_rules! person_columns {
    () => {
        "p.first_name, p.last_name, p.father_name, p.national_id, p.id_number, \
         p.birth_date, p.birth_city_id, p.gender, p.marital_status, p.military_status, p.address"
    };
}
pub(crate) use person_columns;

/// Build a person from a row containing `person_columns!()` and `person_id`
pub(crate) fn person_from_row(row: &SqliteRow) -> Result<Person> {
    let gender: String = row.get("gender");
    let marital: String = row.get("marital_status");
    let military: Option<String> = row.get("military_status");

    Ok(Person {
        id: row.get("person_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        father_name: row.get("father_name"),
        national_id: row.get("national_id"),
        id_number: row.get("id_number"),
        birth_date: row.get("birth_date"),
        birth_city_id: row.get("birth_city_id"),
        gender: Gender::from_code(&gender)?,
        marital_status: MaritalStatus::from_code(&marital)?,
        military_status: military.as_deref().map(MilitaryStatus::from_code).transpose()?,
        address: row.get("address"),
    })
}

/// Validate and insert a person, returning its id
///
/// A national id already on file is reported as `Duplicate`.
pub async fn insert_person(conn: &mut SqliteConnection, person: &NewPerson) -> Result<i64> {
    person.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO persons (
            first_name, last_name, father_name, national_id, id_number,
            birth_date, birth_city_id, gender, marital_status, military_status, address
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(person.first_name.trim())
    .bind(person.last_name.trim())
    .bind(person.father_name.trim())
    .bind(&person.national_id)
    .bind(&person.id_number)
    .bind(&person.birth_date)
    .bind(person.birth_city_id)
    .bind(person.gender.code())
    .bind(person.marital_status.code())
    .bind(person.military_status.map(|m| m.code()))
    .bind(&person.address)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("National id {} is already on file", person.national_id))
        })
    })?;

    Ok(result.last_insert_rowid())
}
