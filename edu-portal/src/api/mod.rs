//! HTTP API handlers for edu-portal

pub mod admin;
pub mod auth;
pub mod courses;
pub mod health;
pub mod params;
pub mod registration;
pub mod student;

pub use auth::{admin_auth_middleware, login, student_auth_middleware, AuthenticatedStudent};
pub use health::health_routes;
