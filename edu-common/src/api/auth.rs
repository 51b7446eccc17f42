//! Authentication primitives
//!
//! Two schemes, each with its own key in the `settings` table:
//!
//! - Admin requests carry `timestamp` (Unix epoch ms) and `hash` (SHA-256 over
//!   the canonical JSON of the request with the hash field zeroed, followed by
//!   `api_shared_secret`). A secret of 0 disables the check.
//! - Students log in with their student number and password and receive a
//!   bearer token `student_number.expiry_ms.signature` signed with
//!   `student_token_key`. That key is never 0.
//!
//! No HTTP framework dependencies here; the portal wraps these in middleware.

use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// Placeholder substituted for the `hash` field before hashing
const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Accepted age of an admin request timestamp
pub const MAX_TIMESTAMP_AGE_MS: i64 = 1000;

/// Accepted clock skew into the future
pub const MAX_TIMESTAMP_SKEW_MS: i64 = 1;

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    InvalidHash { provided: String, calculated: String },

    /// Timestamp field missing from request
    MissingTimestamp,

    /// Hash field missing from request
    MissingHash,

    /// Bearer token malformed, forged or expired
    InvalidToken(String),

    /// Database error loading shared secret
    DatabaseError(String),

    /// Failed to parse request body
    ParseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::InvalidTimestamp { reason, .. } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            ApiAuthError::InvalidHash { .. } => write!(f, "Invalid hash"),
            ApiAuthError::MissingTimestamp => write!(f, "Missing timestamp field"),
            ApiAuthError::MissingHash => write!(f, "Missing hash field"),
            ApiAuthError::InvalidToken(reason) => write!(f, "Invalid token: {}", reason),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
            ApiAuthError::ParseError(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Shared Secret Management
// ========================================

const SHARED_SECRET_KEY: &str = "api_shared_secret";
const TOKEN_KEY: &str = "student_token_key";

async fn load_key(db: &SqlitePool, key: &str) -> Result<Option<i64>, ApiAuthError> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    result
        .map(|(value,)| {
            value
                .parse::<i64>()
                .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64 for {}: {}", key, e)))
        })
        .transpose()
}

/// Generate and store a random non-zero value under `key`
async fn initialize_key(db: &SqlitePool, key: &str) -> Result<i64, ApiAuthError> {
    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Load the admin shared secret, generating one on first use
///
/// Key `api_shared_secret`, value an i64. 0 disables admin auth.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    match load_key(db, SHARED_SECRET_KEY).await? {
        Some(secret) => Ok(secret),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero admin secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    initialize_key(db, SHARED_SECRET_KEY).await
}

/// Load the student token signing key
///
/// Independent of the admin secret, so disabling admin auth leaves student
/// tokens intact. A missing or zero value is replaced by a fresh key, which
/// invalidates tokens issued before.
pub async fn load_token_key(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    match load_key(db, TOKEN_KEY).await? {
        Some(key) if key != 0 => Ok(key),
        _ => initialize_key(db, TOKEN_KEY).await,
    }
}

// ========================================
// Admin request validation
// ========================================

/// Timestamp must be at most 1000ms old and at most 1ms ahead
///
/// ```
/// use edu_common::api::auth::validate_timestamp;
/// use std::time::{SystemTime, UNIX_EPOCH};
///
/// let now = SystemTime::now()
///     .duration_since(UNIX_EPOCH)
///     .unwrap()
///     .as_millis() as i64;
///
/// assert!(validate_timestamp(now - 500).is_ok());
/// assert!(validate_timestamp(now - 2000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    let now = now_ms();
    let diff = now - timestamp;

    if diff > MAX_TIMESTAMP_AGE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms too old (max {}ms past)",
                diff, MAX_TIMESTAMP_AGE_MS
            ),
        });
    }

    if diff < -MAX_TIMESTAMP_SKEW_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_TIMESTAMP_SKEW_MS
            ),
        });
    }

    Ok(())
}

/// SHA-256 of the canonical request JSON (hash field zeroed) followed by the secret
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(ZERO_HASH.to_string()));
    }

    sha256_hex(&format!("{}{}", to_canonical_json(&value), shared_secret))
}

/// JSON with sorted keys and no whitespace
///
/// ```
/// use edu_common::api::auth::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": 1}));
/// assert_eq!(canonical, "{\"a\":1,\"z\":3}");
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("\"{}\":{}", k, to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if provided_hash != calculated {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

// ========================================
// Student credentials
// ========================================

/// Hash a password with a fresh random salt, returns `(hash, salt)`
pub fn hash_password(password: &str) -> (String, String) {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt: String = salt_bytes.iter().map(|b| format!("{:02x}", b)).collect();
    (sha256_hex(&format!("{}{}", salt, password)), salt)
}

/// Accounts without a stored hash never verify
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    !hash.is_empty() && sha256_hex(&format!("{}{}", salt, password)) == hash
}

fn token_signature(student_number: &str, expires_at_ms: i64, shared_secret: i64) -> String {
    sha256_hex(&format!("{}.{}{}", student_number, expires_at_ms, shared_secret))
}

fn require_token_key(token_key: i64) -> Result<(), ApiAuthError> {
    if token_key == 0 {
        return Err(ApiAuthError::InvalidToken("token signing key not set".to_string()));
    }
    Ok(())
}

/// Issue a bearer token valid for `ttl_secs`
///
/// Fails when `token_key` is 0: such a signature would be computable by anyone.
pub fn issue_token(
    student_number: &str,
    token_key: i64,
    ttl_secs: u64,
) -> Result<String, ApiAuthError> {
    require_token_key(token_key)?;
    let expires_at = now_ms().saturating_add((ttl_secs as i64).saturating_mul(1000));
    Ok(format!(
        "{}.{}.{}",
        student_number,
        expires_at,
        token_signature(student_number, expires_at, token_key)
    ))
}

/// Check a bearer token, returns the student number it was issued for
pub fn verify_token(token: &str, token_key: i64) -> Result<String, ApiAuthError> {
    require_token_key(token_key)?;

    let mut parts = token.splitn(3, '.');
    let (student_number, expiry, signature) = match (parts.next(), parts.next(), parts.next()) {
        (Some(n), Some(e), Some(s)) if !n.is_empty() => (n, e, s),
        _ => return Err(ApiAuthError::InvalidToken("malformed".to_string())),
    };

    let expires_at: i64 = expiry
        .parse()
        .map_err(|_| ApiAuthError::InvalidToken("malformed expiry".to_string()))?;

    if token_signature(student_number, expires_at, token_key) != signature {
        return Err(ApiAuthError::InvalidToken("bad signature".to_string()));
    }
    if now_ms() > expires_at {
        return Err(ApiAuthError::InvalidToken("expired".to_string()));
    }

    Ok(student_number.to_string())
}
