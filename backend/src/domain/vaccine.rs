//! Vaccine catalogue entities.
//!
//! A vaccine is a catalogue entry describing an immunization product: a
//! unique name and the number of doses the full course requires. Validation
//! lives in the newtypes so invalid values never reach the persistence layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a vaccine name in characters.
pub const VACCINE_NAME_MAX: usize = 100;
/// Smallest allowed dose count for a course.
pub const DOSE_COUNT_MIN: i32 = 1;
/// Largest allowed dose count for a course.
pub const DOSE_COUNT_MAX: i32 = 10;

/// Validation errors raised when constructing vaccine values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaccineValidationError {
    EmptyName,
    NameTooLong { max: usize },
    DosesOutOfRange { min: i32, max: i32 },
}

impl fmt::Display for VaccineValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "vaccine name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "vaccine name must be at most {max} characters")
            }
            Self::DosesOutOfRange { min, max } => {
                write!(f, "dose count must be between {min} and {max}")
            }
        }
    }
}

impl std::error::Error for VaccineValidationError {}

/// Vaccine name, trimmed and bounded to [`VACCINE_NAME_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaccineName(String);

impl VaccineName {
    /// Validate and construct a [`VaccineName`].
    pub fn new(name: impl Into<String>) -> Result<Self, VaccineValidationError> {
        let trimmed = name.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(VaccineValidationError::EmptyName);
        }
        if trimmed.chars().count() > VACCINE_NAME_MAX {
            return Err(VaccineValidationError::NameTooLong {
                max: VACCINE_NAME_MAX,
            });
        }
        Ok(Self(trimmed))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for VaccineName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for VaccineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VaccineName> for String {
    fn from(value: VaccineName) -> Self {
        value.0
    }
}

impl TryFrom<String> for VaccineName {
    type Error = VaccineValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Number of doses in a full vaccination course, within
/// [`DOSE_COUNT_MIN`]..=[`DOSE_COUNT_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DoseCount(i32);

impl DoseCount {
    /// Validate and construct a [`DoseCount`].
    pub fn new(doses: i32) -> Result<Self, VaccineValidationError> {
        if !(DOSE_COUNT_MIN..=DOSE_COUNT_MAX).contains(&doses) {
            return Err(VaccineValidationError::DosesOutOfRange {
                min: DOSE_COUNT_MIN,
                max: DOSE_COUNT_MAX,
            });
        }
        Ok(Self(doses))
    }

    /// Access the underlying count.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<DoseCount> for i32 {
    fn from(value: DoseCount) -> Self {
        value.0
    }
}

impl TryFrom<i32> for DoseCount {
    type Error = VaccineValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DoseCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted vaccine catalogue entry.
///
/// ## Invariants
/// - `name` is unique across the catalogue (enforced by the service and the
///   database UNIQUE constraint).
/// - `doses` stays within the validated range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    /// Database-generated identifier.
    pub id: i32,
    /// Unique vaccine name.
    pub name: VaccineName,
    /// Number of doses in the full course.
    pub doses: DoseCount,
}

/// Vaccine data accepted for creation, before an identifier exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVaccine {
    pub name: VaccineName,
    pub doses: DoseCount,
}

impl NewVaccine {
    /// Fallible constructor from raw request values.
    pub fn try_from_parts(name: impl Into<String>, doses: i32) -> Result<Self, VaccineValidationError> {
        Ok(Self {
            name: VaccineName::new(name)?,
            doses: DoseCount::new(doses)?,
        })
    }
}
