//! Vaccination history use cases.
//!
//! Creation enforces the referential invariant against the vaccine catalogue
//! and the dose-number range; the database FOREIGN KEY is only the backstop
//! for races with concurrent catalogue changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use super::error::Error;
use super::history::{
    DateRange, DoseStatus, HistoryFilter, HistoryStatistics, NewVaccinationRecord, UpcomingDose,
    VaccinationRecord,
};
use super::ports::{HistoryRepository, VaccineRepository};
use super::vaccine_service::{map_repository_error, vaccine_not_found};

/// Scheduled doses surfaced in a statistics summary.
const UPCOMING_DOSES_LIMIT: usize = 5;

/// Unvalidated list parameters as they arrive from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryListRequest {
    pub user_id: Option<i32>,
    pub vaccine_id: Option<i32>,
    pub status: Option<super::history::DoseStatus>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Service exposing the vaccination history operations.
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryRepository>,
    vaccines: Arc<dyn VaccineRepository>,
}

impl HistoryService {
    /// Create a service over the given repositories.
    pub fn new(history: Arc<dyn HistoryRepository>, vaccines: Arc<dyn VaccineRepository>) -> Self {
        Self { history, vaccines }
    }

    /// List history records with optional filters.
    pub async fn list(&self, request: HistoryListRequest) -> Result<Vec<VaccinationRecord>, Error> {
        let filter = build_filter(request)?;
        self.history
            .list(&filter)
            .await
            .map_err(map_repository_error)
    }

    /// Fetch a single record by identifier.
    pub async fn get(&self, id: i32) -> Result<VaccinationRecord, Error> {
        self.history
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| record_not_found(id))
    }

    /// Summarise one user's history: dose counts per status, course
    /// completion per vaccine, and the next scheduled doses.
    pub async fn statistics(&self, user_id: i32) -> Result<HistoryStatistics, Error> {
        if user_id <= 0 {
            return Err(Error::invalid_request("usuario_id must be positive")
                .with_details(json!({ "field": "usuario_id", "code": "invalid_reference" })));
        }

        let records = self
            .history
            .list(&HistoryFilter::for_user(user_id))
            .await
            .map_err(map_repository_error)?;

        let mut stats = HistoryStatistics {
            total_doses: records.len(),
            ..HistoryStatistics::default()
        };
        let mut applied_per_vaccine: BTreeMap<i32, i32> = BTreeMap::new();
        for record in &records {
            match record.status {
                DoseStatus::Applied => stats.applied += 1,
                DoseStatus::Pending => stats.pending += 1,
                DoseStatus::Overdue => stats.overdue += 1,
                DoseStatus::Cancelled => stats.cancelled += 1,
            }
            let applied = applied_per_vaccine.entry(record.vaccine_id).or_insert(0);
            if record.status == DoseStatus::Applied {
                *applied += 1;
            }
        }

        let mut vaccine_names: BTreeMap<i32, String> = BTreeMap::new();
        for (&vaccine_id, &applied) in &applied_per_vaccine {
            // A record can outlive its vaccine only through a catalogue race;
            // such a vaccine counts as an unfinished course.
            let vaccine = self
                .vaccines
                .find_by_id(vaccine_id)
                .await
                .map_err(map_repository_error)?;
            match vaccine {
                Some(vaccine) => {
                    if applied >= vaccine.doses.get() {
                        stats.complete_vaccines += 1;
                    } else {
                        stats.incomplete_vaccines += 1;
                    }
                    vaccine_names.insert(vaccine_id, vaccine.name.as_str().to_owned());
                }
                None => stats.incomplete_vaccines += 1,
            }
        }

        let mut scheduled: Vec<(&VaccinationRecord, NaiveDate)> = records
            .iter()
            .filter(|record| record.status == DoseStatus::Pending)
            .filter_map(|record| record.scheduled_for.map(|date| (record, date)))
            .collect();
        scheduled.sort_by_key(|(_, date)| *date);
        stats.upcoming = scheduled
            .into_iter()
            .filter_map(|(record, date)| {
                vaccine_names.get(&record.vaccine_id).map(|name| UpcomingDose {
                    vaccine_name: name.clone(),
                    dose_number: record.dose_number,
                    scheduled_for: date,
                })
            })
            .take(UPCOMING_DOSES_LIMIT)
            .collect();

        Ok(stats)
    }

    /// Create a history record after validating its references.
    pub async fn create(&self, record: NewVaccinationRecord) -> Result<VaccinationRecord, Error> {
        if record.user_id <= 0 {
            return Err(Error::invalid_request("usuario_id must be positive")
                .with_details(json!({ "field": "usuario_id", "code": "invalid_reference" })));
        }

        let vaccine = self
            .vaccines
            .find_by_id(record.vaccine_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| vaccine_not_found(record.vaccine_id))?;

        if record.dose_number < 1 || record.dose_number > vaccine.doses.get() {
            return Err(Error::invalid_request(format!(
                "dose number must be between 1 and {}",
                vaccine.doses
            ))
            .with_details(json!({
                "field": "numero_dose",
                "code": "dose_out_of_range",
                "max": vaccine.doses.get(),
            })));
        }

        let created = self
            .history
            .insert(&record)
            .await
            .map_err(map_repository_error)?;
        info!(
            record_id = created.id,
            user_id = created.user_id,
            vaccine_id = created.vaccine_id,
            dose = created.dose_number,
            "vaccination record created"
        );
        Ok(created)
    }
}

/// Translate year/month parameters into an inclusive date range.
///
/// A month filter without a year is ambiguous across years and rejected.
fn build_filter(request: HistoryListRequest) -> Result<HistoryFilter, Error> {
    let applied_within = match (request.year, request.month) {
        (None, None) => None,
        (None, Some(_)) => {
            return Err(Error::invalid_request("mes requires ano")
                .with_details(json!({ "field": "mes", "code": "month_without_year" })));
        }
        (Some(year), None) => Some(year_range(year)?),
        (Some(year), Some(month)) => Some(month_range(year, month)?),
    };

    Ok(HistoryFilter {
        user_id: request.user_id,
        vaccine_id: request.vaccine_id,
        status: request.status,
        applied_within,
    })
}

fn year_range(year: i32) -> Result<DateRange, Error> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| invalid_year(year))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| invalid_year(year))?;
    Ok(DateRange { start, end })
}

fn month_range(year: i32, month: u32) -> Result<DateRange, Error> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid_month(month))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| invalid_month(month))?;
    let end = next.pred_opt().ok_or_else(|| invalid_month(month))?;
    Ok(DateRange { start, end })
}

fn record_not_found(id: i32) -> Error {
    Error::not_found(format!("history record {id} not found"))
}

fn invalid_year(year: i32) -> Error {
    Error::invalid_request(format!("invalid year: {year}"))
        .with_details(json!({ "field": "ano", "code": "invalid_year" }))
}

fn invalid_month(month: u32) -> Error {
    Error::invalid_request(format!("invalid month: {month}"))
        .with_details(json!({ "field": "mes", "code": "invalid_month" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::DoseStatus;
    use crate::domain::ports::{InMemoryHistoryRepository, InMemoryVaccineRepository};
    use crate::domain::vaccine::NewVaccine;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    async fn service_with_vaccine(doses: i32) -> (HistoryService, i32) {
        let vaccines = Arc::new(InMemoryVaccineRepository::new());
        let created = vaccines
            .insert(&NewVaccine::try_from_parts("Hepatite B", doses).expect("valid vaccine"))
            .await
            .expect("insert succeeds");
        let service = HistoryService::new(Arc::new(InMemoryHistoryRepository::new()), vaccines);
        (service, created.id)
    }

    fn record(user_id: i32, vaccine_id: i32, dose_number: i32) -> NewVaccinationRecord {
        NewVaccinationRecord {
            user_id,
            vaccine_id,
            dose_number,
            ..NewVaccinationRecord::default()
        }
    }

    #[tokio::test]
    async fn unknown_vaccine_fails_and_persists_nothing() {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        let err = service
            .create(record(1, vaccine_id + 100, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let records = service
            .list(HistoryListRequest::default())
            .await
            .expect("list succeeds");
        assert!(records.is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[tokio::test]
    async fn dose_number_outside_course_is_rejected(#[case] dose_number: i32) {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        let err = service
            .create(record(1, vaccine_id, dose_number))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.details.expect("details")["code"], "dose_out_of_range");
    }

    #[tokio::test]
    async fn non_positive_user_reference_is_rejected() {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        let err = service.create(record(0, vaccine_id, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn created_record_is_listed_for_its_user() {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        let created = service
            .create(record(7, vaccine_id, 2))
            .await
            .expect("create succeeds");

        let for_user = service
            .list(HistoryListRequest {
                user_id: Some(7),
                ..HistoryListRequest::default()
            })
            .await
            .expect("list succeeds");
        assert_eq!(for_user, vec![created]);

        let other_user = service
            .list(HistoryListRequest {
                user_id: Some(8),
                ..HistoryListRequest::default()
            })
            .await
            .expect("list succeeds");
        assert!(other_user.is_empty());
    }

    #[tokio::test]
    async fn status_filter_narrows_results() {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        service
            .create(NewVaccinationRecord {
                status: DoseStatus::Applied,
                ..record(1, vaccine_id, 1)
            })
            .await
            .expect("create succeeds");
        service
            .create(record(1, vaccine_id, 2))
            .await
            .expect("create succeeds");

        let applied = service
            .list(HistoryListRequest {
                status: Some(DoseStatus::Applied),
                ..HistoryListRequest::default()
            })
            .await
            .expect("list succeeds");
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].status, DoseStatus::Applied);
    }

    #[tokio::test]
    async fn get_returns_record_or_not_found() {
        let (service, vaccine_id) = service_with_vaccine(3).await;
        let created = service
            .create(record(1, vaccine_id, 1))
            .await
            .expect("create succeeds");

        let fetched = service.get(created.id).await.expect("record exists");
        assert_eq!(fetched, created);

        let err = service.get(created.id + 100).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn statistics_summarise_counts_and_course_completion() {
        let vaccines = Arc::new(InMemoryVaccineRepository::new());
        let single = vaccines
            .insert(&NewVaccine::try_from_parts("BCG", 1).expect("valid vaccine"))
            .await
            .expect("insert succeeds");
        let triple = vaccines
            .insert(&NewVaccine::try_from_parts("Hepatite B", 3).expect("valid vaccine"))
            .await
            .expect("insert succeeds");
        let service = HistoryService::new(Arc::new(InMemoryHistoryRepository::new()), vaccines);

        service
            .create(NewVaccinationRecord {
                status: DoseStatus::Applied,
                ..record(1, single.id, 1)
            })
            .await
            .expect("create succeeds");
        service
            .create(NewVaccinationRecord {
                status: DoseStatus::Applied,
                ..record(1, triple.id, 1)
            })
            .await
            .expect("create succeeds");
        service
            .create(NewVaccinationRecord {
                scheduled_for: NaiveDate::from_ymd_opt(2026, 3, 1),
                ..record(1, triple.id, 2)
            })
            .await
            .expect("create succeeds");
        service
            .create(NewVaccinationRecord {
                status: DoseStatus::Cancelled,
                ..record(2, triple.id, 1)
            })
            .await
            .expect("create succeeds");

        let stats = service.statistics(1).await.expect("statistics succeed");
        assert_eq!(stats.total_doses, 3);
        assert_eq!((stats.applied, stats.pending), (2, 1));
        assert_eq!((stats.overdue, stats.cancelled), (0, 0));
        assert_eq!(stats.complete_vaccines, 1);
        assert_eq!(stats.incomplete_vaccines, 1);
        assert_eq!(
            stats.upcoming,
            vec![UpcomingDose {
                vaccine_name: "Hepatite B".to_owned(),
                dose_number: 2,
                scheduled_for: NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            }]
        );
    }

    #[tokio::test]
    async fn statistics_cap_upcoming_doses_and_sort_by_date() {
        let (service, vaccine_id) = service_with_vaccine(10).await;
        for dose in 1u32..=7 {
            service
                .create(NewVaccinationRecord {
                    scheduled_for: NaiveDate::from_ymd_opt(2026, 12, 8 - dose),
                    ..record(1, vaccine_id, i32::try_from(dose).expect("small dose"))
                })
                .await
                .expect("create succeeds");
        }

        let stats = service.statistics(1).await.expect("statistics succeed");
        assert_eq!(stats.upcoming.len(), 5);
        let dates: Vec<_> = stats.upcoming.iter().map(|dose| dose.scheduled_for).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        // The two latest schedule dates fall outside the cap.
        assert_eq!(stats.upcoming[0].dose_number, 7);
    }

    #[tokio::test]
    async fn statistics_reject_non_positive_user_reference() {
        let (service, _) = service_with_vaccine(3).await;
        let err = service.statistics(0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn month_without_year_is_rejected() {
        let (service, _) = service_with_vaccine(3).await;
        let err = service
            .list(HistoryListRequest {
                month: Some(5),
                ..HistoryListRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.details.expect("details")["code"], "month_without_year");
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2024, 12, 31)]
    fn month_range_ends_on_last_day(#[case] year: i32, #[case] month: u32, #[case] last: u32) {
        let range = month_range(year, month).expect("valid range");
        assert_eq!(
            range.end,
            NaiveDate::from_ymd_opt(year, month, last).expect("valid date")
        );
    }
}
