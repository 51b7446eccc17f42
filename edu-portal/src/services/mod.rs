//! Domain services composed from the `edu-common` store
//!
//! Each mutation here owns its transaction; handlers only translate
//! between HTTP and these calls.

pub mod assignment;
pub mod enrollment;
pub mod format;
pub mod metrics;
pub mod schedule;
pub mod semester;
