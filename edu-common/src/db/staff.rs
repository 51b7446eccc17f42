//! Staff records

use crate::calendar::JalaliDate;
use crate::db::models::StaffContract;
use crate::db::persons::{insert_person, person_columns, person_from_row, NewPerson, Person};
use crate::validation::require_text;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    #[serde(flatten)]
    pub person: NewPerson,
    pub employee_number: String,
    #[serde(default = "default_contract")]
    pub contract_type: StaffContract,
    pub hire_date: String,
    pub position: String,
}

fn default_contract() -> StaffContract {
    StaffContract::FullTime
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffMember {
    pub id: i64,
    pub person: Person,
    pub employee_number: String,
    pub contract_type: StaffContract,
    pub hire_date: String,
    pub position: String,
    pub is_active: bool,
}

pub async fn create_staff(pool: &SqlitePool, staff: &NewStaff) -> Result<i64> {
    require_text("Employee number", &staff.employee_number)?;
    require_text("Position", &staff.position)?;
    staff.hire_date.parse::<JalaliDate>()?;

    let mut tx = pool.begin().await?;
    let person_id = insert_person(&mut tx, &staff.person).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO staff (person_id, employee_number, contract_type, hire_date, position)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(person_id)
    .bind(staff.employee_number.trim())
    .bind(staff.contract_type.code())
    .bind(&staff.hire_date)
    .bind(staff.position.trim())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Employee number {} is taken", staff.employee_number))
        })
    })?;

    tx.commit().await?;

    let id = result.last_insert_rowid();
    info!(staff_id = id, "Created staff member");
    Ok(id)
}

pub async fn load_staff<'e, E: SqliteExecutor<'e>>(exec: E, staff_id: i64) -> Result<StaffMember> {
    let row = sqlx::query(concat!(
        "SELECT st.id, st.person_id, st.employee_number, st.contract_type, st.hire_date, \
         st.position, st.is_active, ",
        person_columns!(),
        " FROM staff st JOIN persons p ON p.id = st.person_id WHERE st.id = ?"
    ))
    .bind(staff_id)
    .fetch_optional(exec)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Staff member {}", staff_id)))?;

    let contract: String = row.get("contract_type");
    Ok(StaffMember {
        id: row.get("id"),
        person: person_from_row(&row)?,
        employee_number: row.get("employee_number"),
        contract_type: StaffContract::from_code(&contract)?,
        hire_date: row.get("hire_date"),
        position: row.get("position"),
        is_active: row.get("is_active"),
    })
}
