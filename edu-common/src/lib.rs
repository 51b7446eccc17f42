//! # Education Portal Common Library
//!
//! Shared code for the portal:
//! - Database schema, models and queries
//! - Error taxonomy
//! - Configuration loading
//! - Jalali calendar and reference-data validators
//! - Authentication primitives

pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorKind, Result};
