//! Vaccination history entities.
//!
//! A vaccination record links an external user identifier to a catalogue
//! vaccine and a dose. The user identifier is opaque here: the Auth service
//! owns user identity, so records only carry the reference.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a dose in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    /// Dose scheduled but not yet applied (wire value `pendente`).
    #[serde(rename = "pendente")]
    Pending,
    /// Dose administered (wire value `aplicada`).
    #[serde(rename = "aplicada")]
    Applied,
    /// Scheduled date passed without application (wire value `atrasada`).
    #[serde(rename = "atrasada")]
    Overdue,
    /// Dose cancelled (wire value `cancelada`).
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl DoseStatus {
    /// Wire representation, shared by the JSON API and the database column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendente",
            Self::Applied => "aplicada",
            Self::Overdue => "atrasada",
            Self::Cancelled => "cancelada",
        }
    }
}

impl Default for DoseStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown dose status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dose status: {value}")]
pub struct ParseDoseStatusError {
    pub value: String,
}

impl FromStr for DoseStatus {
    type Err = ParseDoseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(Self::Pending),
            "aplicada" => Ok(Self::Applied),
            "atrasada" => Ok(Self::Overdue),
            "cancelada" => Ok(Self::Cancelled),
            other => Err(ParseDoseStatusError {
                value: other.to_owned(),
            }),
        }
    }
}

/// Persisted vaccination history record.
///
/// ## Invariants
/// - `vaccine_id` references an existing catalogue vaccine.
/// - `dose_number` stays within 1..=the vaccine's dose count at creation.
/// - `user_id` is an opaque external identifier; it is validated by format
///   only and never resolved locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    /// Database-generated identifier.
    pub id: i32,
    /// Opaque identifier owned by the Auth service.
    pub user_id: i32,
    /// Referenced catalogue vaccine.
    pub vaccine_id: i32,
    /// Position of this dose in the course, starting at 1.
    pub dose_number: i32,
    /// Lifecycle status of the dose.
    pub status: DoseStatus,
    /// Date the dose was administered, when known.
    pub applied_on: Option<NaiveDate>,
    /// Date the dose is scheduled for, when known.
    pub scheduled_for: Option<NaiveDate>,
    /// Manufacturer batch of the applied dose.
    pub batch: Option<String>,
    /// Clinic or site where the dose was applied.
    pub site: Option<String>,
    /// Professional who administered the dose.
    pub professional: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Vaccination record data accepted for creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewVaccinationRecord {
    pub user_id: i32,
    pub vaccine_id: i32,
    pub dose_number: i32,
    pub status: DoseStatus,
    pub applied_on: Option<NaiveDate>,
    pub scheduled_for: Option<NaiveDate>,
    pub batch: Option<String>,
    pub site: Option<String>,
    pub professional: Option<String>,
    pub notes: Option<String>,
}

/// Inclusive date range used to filter on the application date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Optional filters applied when listing history records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Restrict to one user's history.
    pub user_id: Option<i32>,
    /// Restrict to records of one vaccine.
    pub vaccine_id: Option<i32>,
    /// Restrict to records with this dose status.
    pub status: Option<DoseStatus>,
    /// Restrict to records applied within this range.
    pub applied_within: Option<DateRange>,
}

impl HistoryFilter {
    /// Filter matching a single user's records.
    pub fn for_user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

/// A pending dose with a known schedule date, surfaced in the statistics
/// summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingDose {
    /// Name of the catalogue vaccine the dose belongs to.
    pub vaccine_name: String,
    /// Position of the dose in its course.
    pub dose_number: i32,
    /// Date the dose is scheduled for.
    pub scheduled_for: NaiveDate,
}

/// Aggregated view of one user's vaccination history.
///
/// A vaccine counts as complete once the number of applied doses reaches the
/// dose count of its course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStatistics {
    /// Records of any status.
    pub total_doses: usize,
    pub applied: usize,
    pub pending: usize,
    pub overdue: usize,
    pub cancelled: usize,
    /// Vaccines whose course the user has finished.
    pub complete_vaccines: usize,
    /// Vaccines with at least one record but an unfinished course.
    pub incomplete_vaccines: usize,
    /// Next scheduled pending doses, soonest first.
    pub upcoming: Vec<UpcomingDose>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pendente", DoseStatus::Pending)]
    #[case("aplicada", DoseStatus::Applied)]
    #[case("atrasada", DoseStatus::Overdue)]
    #[case("cancelada", DoseStatus::Cancelled)]
    fn parses_wire_statuses(#[case] raw: &str, #[case] expected: DoseStatus) {
        assert_eq!(raw.parse::<DoseStatus>().expect("known status"), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "applied".parse::<DoseStatus>().unwrap_err();
        assert_eq!(err.value, "applied");
    }

    #[test]
    fn status_serialises_to_wire_value() {
        let json = serde_json::to_string(&DoseStatus::Overdue).expect("serialises");
        assert_eq!(json, "\"atrasada\"");
    }

    #[test]
    fn filter_for_user_sets_only_user() {
        let filter = HistoryFilter::for_user(7);
        assert_eq!(filter.user_id, Some(7));
        assert!(filter.vaccine_id.is_none() && filter.status.is_none());
    }
}
