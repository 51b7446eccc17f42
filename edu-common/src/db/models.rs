//! Database models
//!
//! Enumerations stored as single-letter (or two-letter) codes, plus the
//! tagged contact owner. Each enum round-trips through `code()` and
//! `from_code()`; unknown codes in stored rows surface as `InvalidInput`.

use crate::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Implements `code()`, `from_code()`, `Display` and serde (as the code) for a code-backed enum
macro_rules! coded_enum {
    ($name:ident, $what:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            /// Storage code
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Parse a storage code
            pub fn from_code(code: &str) -> Result<Self> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        concat!("Unknown ", $what, " code '{}'"),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let code = String::deserialize(deserializer)?;
                $name::from_code(&code).map_err(de::Error::custom)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

coded_enum!(Gender, "gender", { Male => "M", Female => "F" });

impl Gender {
    /// English label used by the student API
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

coded_enum!(MaritalStatus, "marital status", {
    Single => "S",
    Married => "M",
    Divorced => "D",
    Widowed => "W",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilitaryStatus {
    Exempt,
    Eligible,
    Discharged,
    NotApplicable,
}

coded_enum!(MilitaryStatus, "military status", {
    Exempt => "E",
    Eligible => "C",
    Discharged => "D",
    NotApplicable => "N",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcademicStatus {
    Active,
    Graduated,
    Withdrawn,
    Suspended,
}

coded_enum!(AcademicStatus, "academic status", {
    Active => "A",
    Graduated => "G",
    Withdrawn => "W",
    Suspended => "S",
});

/// Status of a student's registration in a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Passed,
    Failed,
    Withdrawn,
    Incomplete,
}

coded_enum!(RegistrationStatus, "registration status", {
    Registered => "R",
    Passed => "P",
    Failed => "F",
    Withdrawn => "W",
    Incomplete => "I",
});

impl RegistrationStatus {
    /// Registered, passed and failed rows count against class capacity
    pub fn holds_seat(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Registered | RegistrationStatus::Passed | RegistrationStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

coded_enum!(Weekday, "weekday", {
    Saturday => "SA",
    Sunday => "SU",
    Monday => "MO",
    Tuesday => "TU",
    Wednesday => "WE",
    Thursday => "TH",
    Friday => "FR",
});

impl Weekday {
    /// Persian day name shown in class listings
    pub fn persian_name(&self) -> &'static str {
        match self {
            Weekday::Saturday => "شنبه",
            Weekday::Sunday => "یکشنبه",
            Weekday::Monday => "دوشنبه",
            Weekday::Tuesday => "سه شنبه",
            Weekday::Wednesday => "چهارشنبه",
            Weekday::Thursday => "پنج شنبه",
            Weekday::Friday => "جمعه",
        }
    }
}

/// Professor contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfessorContract {
    FullTime,
    PartTime,
    Visiting,
}

coded_enum!(ProfessorContract, "professor contract", {
    FullTime => "F",
    PartTime => "P",
    Visiting => "V",
});

/// Staff contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffContract {
    FullTime,
    PartTime,
    Contractual,
}

coded_enum!(StaffContract, "staff contract", {
    FullTime => "F",
    PartTime => "P",
    Contractual => "C",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Classroom,
    Laboratory,
    Seminar,
    Auditorium,
}

coded_enum!(RoomType, "room type", {
    Classroom => "C",
    Laboratory => "L",
    Seminar => "O",
    Auditorium => "A",
});

/// Owner of a contact row
///
/// Stored as `(owner_kind, owner_id)`; the id refers to the role table
/// named by the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContactOwner {
    Student(i64),
    Professor(i64),
    Staff(i64),
}

impl ContactOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            ContactOwner::Student(_) => "student",
            ContactOwner::Professor(_) => "professor",
            ContactOwner::Staff(_) => "staff",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ContactOwner::Student(id) | ContactOwner::Professor(id) | ContactOwner::Staff(id) => *id,
        }
    }

    /// Rebuild from stored columns
    pub fn from_parts(kind: &str, id: i64) -> Result<Self> {
        match kind {
            "student" => Ok(ContactOwner::Student(id)),
            "professor" => Ok(ContactOwner::Professor(id)),
            "staff" => Ok(ContactOwner::Staff(id)),
            other => Err(Error::InvalidInput(format!("Unknown contact owner kind '{}'", other))),
        }
    }
}
