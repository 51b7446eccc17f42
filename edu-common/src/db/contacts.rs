//! Contact information attached to students, professors or staff
//!
//! The owner is a [`ContactOwner`]; it is resolved against the matching role
//! table before a contact row is written.

use crate::db::models::ContactOwner;
use crate::validation::{require_text, validate_email, validate_mobile};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub owner: ContactOwner,
    /// `mobile`, `email`, `phone`, ...
    pub contact_type: String,
    pub value: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: i64,
    pub owner: ContactOwner,
    pub contact_type: String,
    pub value: String,
    pub is_primary: bool,
}

/// Whether the owner row exists in its role table
pub async fn owner_exists(conn: &mut SqliteConnection, owner: ContactOwner) -> Result<bool> {
    let sql = match owner {
        ContactOwner::Student(_) => "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?)",
        ContactOwner::Professor(_) => "SELECT EXISTS(SELECT 1 FROM professors WHERE id = ?)",
        ContactOwner::Staff(_) => "SELECT EXISTS(SELECT 1 FROM staff WHERE id = ?)",
    };
    let exists: bool = sqlx::query_scalar(sql)
        .bind(owner.id())
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Check a value against the rules of its contact type
pub fn validate_contact_value(contact_type: &str, value: &str) -> Result<()> {
    require_text("Contact value", value)?;
    match contact_type {
        "email" => validate_email(value),
        "mobile" => validate_mobile(value),
        _ => Ok(()),
    }
}

/// Add a contact; a new primary contact demotes the owner's previous primary of that type
pub async fn create_contact(pool: &SqlitePool, contact: &NewContact) -> Result<i64> {
    validate_contact_value(&contact.contact_type, &contact.value)?;

    let mut tx = pool.begin().await?;

    if !owner_exists(&mut tx, contact.owner).await? {
        return Err(Error::NotFound(format!(
            "{} {}",
            contact.owner.kind(),
            contact.owner.id()
        )));
    }

    let type_id: i64 = sqlx::query_scalar("SELECT id FROM contact_types WHERE code = ?")
        .bind(&contact.contact_type)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::InvalidInput(format!("Unknown contact type '{}'", contact.contact_type))
        })?;

    if contact.is_primary {
        sqlx::query(
            r#"
            UPDATE contact_info SET is_primary = 0
            WHERE owner_kind = ? AND owner_id = ? AND contact_type_id = ?
            "#,
        )
        .bind(contact.owner.kind())
        .bind(contact.owner.id())
        .bind(type_id)
        .execute(&mut *tx)
        .await?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO contact_info (owner_kind, owner_id, contact_type_id, value, is_primary)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(contact.owner.kind())
    .bind(contact.owner.id())
    .bind(type_id)
    .bind(contact.value.trim())
    .bind(contact.is_primary)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!("Contact '{}' already recorded", contact.value))
        })
    })?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

/// Contacts of an owner, primary first
pub async fn list_contacts(pool: &SqlitePool, owner: ContactOwner) -> Result<Vec<Contact>> {
    let rows = sqlx::query(
        r#"
        SELECT ci.id, ci.owner_kind, ci.owner_id, ct.code AS contact_type, ci.value, ci.is_primary
        FROM contact_info ci
        JOIN contact_types ct ON ct.id = ci.contact_type_id
        WHERE ci.owner_kind = ? AND ci.owner_id = ?
        ORDER BY ci.is_primary DESC, ct.code, ci.id
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let kind: String = row.get("owner_kind");
            Ok(Contact {
                id: row.get("id"),
                owner: ContactOwner::from_parts(&kind, row.get("owner_id"))?,
                contact_type: row.get("contact_type"),
                value: row.get("value"),
                is_primary: row.get("is_primary"),
            })
        })
        .collect()
}

/// Primary mobile number, falling back to any mobile number
pub async fn mobile_number<'e, E: SqliteExecutor<'e>>(exec: E, owner: ContactOwner) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar(
        r#"
        SELECT ci.value
        FROM contact_info ci
        JOIN contact_types ct ON ct.id = ci.contact_type_id
        WHERE ci.owner_kind = ? AND ci.owner_id = ? AND ct.code = 'mobile'
        ORDER BY ci.is_primary DESC, ci.id
        LIMIT 1
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_optional(exec)
    .await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_rules_follow_type() {
        assert!(validate_contact_value("email", "a@b.ir").is_ok());
        assert!(validate_contact_value("email", "not-an-email").is_err());
        assert!(validate_contact_value("mobile", "09121234567").is_ok());
        assert!(validate_contact_value("mobile", "02188776655").is_err());
        assert!(validate_contact_value("phone", "02188776655").is_ok());
        assert!(validate_contact_value("phone", " ").is_err());
    }
}
