//! Domain entities, ports, and services.
//!
//! Types here are transport and storage agnostic. Inbound adapters translate
//! them to HTTP payloads; outbound adapters implement the ports against the
//! database and the Auth service.

pub mod error;
pub mod history;
pub mod history_service;
pub mod ports;
pub mod user;
pub mod user_service;
pub mod vaccine;
pub mod vaccine_service;

pub use self::error::{Error, ErrorCode};
pub use self::history::{
    DateRange, DoseStatus, HistoryFilter, HistoryStatistics, NewVaccinationRecord, UpcomingDose,
    VaccinationRecord,
};
pub use self::history_service::{HistoryListRequest, HistoryService};
pub use self::user::AuthUser;
pub use self::user_service::UserDirectoryService;
pub use self::vaccine::{DoseCount, NewVaccine, Vaccine, VaccineName, VaccineValidationError};
pub use self::vaccine_service::VaccineService;
