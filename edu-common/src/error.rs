//! Common error types for the education portal

use thiserror::Error;

/// Common result type for portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-visible classification of an [`Error`]
///
/// Every error variant maps to exactly one kind. The HTTP layer picks the
/// status code from the kind, never from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown student, course, class, term, ...
    NotFound,
    /// Consistency rule rejected the mutation
    Conflict,
    /// Malformed identifier or out-of-range value
    Validation,
    /// Missing or invalid credential
    Unauthorized,
    /// Persistence or other internal failure
    Internal,
}

/// Common error types across the portal
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Student already holds a registration for the class
    #[error("Student {student_number} is already registered in class {class_code}")]
    AlreadyRegistered {
        student_number: String,
        class_code: String,
    },

    /// Registered-count reached capacity
    #[error("Class {class_code} is full (capacity {capacity})")]
    ClassFull { class_code: String, capacity: i64 },

    /// Mandatory prerequisite course not passed
    #[error("Course {course_code} requires passing {prerequisite_code} first")]
    PrerequisiteNotMet {
        course_code: String,
        prerequisite_code: String,
    },

    /// Mandatory corequisite neither passed nor taken in the same term
    #[error("Course {course_code} must be taken together with {corequisite_code}")]
    CorequisiteNotMet {
        course_code: String,
        corequisite_code: String,
    },

    /// Class overlaps another class the student already holds
    #[error("Class {class_code} overlaps class {conflicting_class} in the student's schedule")]
    TimeConflict {
        class_code: String,
        conflicting_class: String,
    },

    /// Class overlaps another active class in the same room
    #[error("Schedule conflict with class {conflicting_class} in room {room_code}")]
    ScheduleConflict {
        conflicting_class: String,
        room_code: String,
    },

    /// Another primary instructor is already assigned to the class
    #[error("Class {class_code} already has a primary instructor")]
    DuplicatePrimary { class_code: String },

    /// The class's term does not accept registrations
    #[error("Registration is closed for term {term_code}")]
    RegistrationClosed { term_code: String },

    /// Student's academic status does not allow registration
    #[error("Student {student_number} is not active")]
    StudentInactive { student_number: String },

    /// Unit selection for the term was already finalized
    #[error("Semester {term_code} is already finalized for student {student_number}")]
    AlreadyFinalized {
        student_number: String,
        term_code: String,
    },

    /// Unique constraint rejected a row that is not covered by a dedicated variant
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Missing or invalid credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify the error for the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::Validation,
            Error::AlreadyRegistered { .. }
            | Error::ClassFull { .. }
            | Error::PrerequisiteNotMet { .. }
            | Error::CorequisiteNotMet { .. }
            | Error::TimeConflict { .. }
            | Error::ScheduleConflict { .. }
            | Error::DuplicatePrimary { .. }
            | Error::RegistrationClosed { .. }
            | Error::StudentInactive { .. }
            | Error::AlreadyFinalized { .. }
            | Error::Duplicate(_) => ErrorKind::Conflict,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::InvalidInput(_) => "VALIDATION",
            Error::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            Error::ClassFull { .. } => "CLASS_FULL",
            Error::PrerequisiteNotMet { .. } => "PREREQUISITE_NOT_MET",
            Error::CorequisiteNotMet { .. } => "COREQUISITE_NOT_MET",
            Error::TimeConflict { .. } => "TIME_CONFLICT",
            Error::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            Error::DuplicatePrimary { .. } => "DUPLICATE_PRIMARY",
            Error::RegistrationClosed { .. } => "REGISTRATION_CLOSED",
            Error::StudentInactive { .. } => "STUDENT_INACTIVE",
            Error::AlreadyFinalized { .. } => "ALREADY_FINALIZED",
            Error::Duplicate(_) => "DUPLICATE",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Map a unique-constraint violation to a conflict, pass anything else through
    ///
    /// `what` names the rejected row for the message.
    pub fn on_unique_violation(err: sqlx::Error, what: impl FnOnce() -> Error) -> Error {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => what(),
            _ => Error::Database(err),
        }
    }
}
