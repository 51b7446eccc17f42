//! Database schema, models and queries

pub mod assignments;
pub mod attendance;
pub mod classes;
pub mod contacts;
pub mod courses;
pub mod geography;
pub mod init;
pub mod models;
pub mod payments;
pub mod persons;
pub mod professors;
pub mod programs;
pub mod registrations;
pub mod rooms;
pub mod staff;
pub mod students;
pub mod surveys;
pub mod terms;

pub use init::*;
pub use models::*;
