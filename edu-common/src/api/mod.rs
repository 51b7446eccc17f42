//! Shared API functionality
//!
//! Pure functions and database operations only; the portal wraps them in
//! axum middleware.

pub mod auth;

pub use auth::{
    calculate_hash, hash_password, initialize_shared_secret, issue_token, load_shared_secret,
    load_token_key, validate_hash, validate_timestamp, verify_password, verify_token, ApiAuthError,
};
