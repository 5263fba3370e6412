//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the relational store and the external Auth service). Each trait exposes
//! strongly typed errors so adapters map their failures into predictable
//! variants instead of returning `anyhow::Result`.
//!
//! The `InMemory*` and `Fixture*` implementations back the server when no
//! database or Auth endpoint is configured, and give tests an isolated
//! substitute for the real adapters.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use super::history::{HistoryFilter, NewVaccinationRecord, VaccinationRecord};
use super::user::AuthUser;
use super::vaccine::{NewVaccine, Vaccine};

/// Errors surfaced by the persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Database connectivity or pool checkout failures.
    #[error("repository connection failed: {message}")]
    Connection { message: String },
    /// Query construction or execution failures.
    #[error("repository query failed: {message}")]
    Query { message: String },
    /// A UNIQUE constraint rejected the write.
    #[error("duplicate key: {message}")]
    DuplicateKey { message: String },
    /// A FOREIGN KEY constraint rejected the write.
    #[error("missing reference: {message}")]
    ForeignKey { message: String },
}

impl RepositoryError {
    /// Helper for connection-level failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for UNIQUE violations.
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
        }
    }

    /// Helper for FOREIGN KEY violations.
    pub fn foreign_key(message: impl Into<String>) -> Self {
        Self::ForeignKey {
            message: message.into(),
        }
    }
}

/// Durable storage for the vaccine catalogue.
#[async_trait]
pub trait VaccineRepository: Send + Sync {
    /// Return every catalogue entry, ordered by identifier.
    async fn list(&self) -> Result<Vec<Vaccine>, RepositoryError>;

    /// Look up one vaccine by identifier.
    async fn find_by_id(&self, id: i32) -> Result<Option<Vaccine>, RepositoryError>;

    /// Look up one vaccine by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Vaccine>, RepositoryError>;

    /// Persist a new vaccine and return it with its generated identifier.
    async fn insert(&self, vaccine: &NewVaccine) -> Result<Vaccine, RepositoryError>;
}

/// Durable storage for vaccination history records.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Return records matching the filter, most recently applied first with
    /// unapplied records last.
    async fn list(&self, filter: &HistoryFilter) -> Result<Vec<VaccinationRecord>, RepositoryError>;

    /// Look up one record by identifier.
    async fn find_by_id(&self, id: i32) -> Result<Option<VaccinationRecord>, RepositoryError>;

    /// Persist a new record and return it with its generated identifier.
    async fn insert(
        &self,
        record: &NewVaccinationRecord,
    ) -> Result<VaccinationRecord, RepositoryError>;
}

/// Errors surfaced by the Auth gateway adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthGatewayError {
    /// The Auth service does not know the identifier.
    #[error("user not found")]
    NotFound,
    /// The Auth service rejected the presented credentials.
    #[error("authentication rejected: {message}")]
    Unauthorized { message: String },
    /// The round-trip exceeded the configured timeout.
    #[error("auth service timed out: {message}")]
    Timeout { message: String },
    /// Connection-level failure reaching the Auth service.
    #[error("auth service unreachable: {message}")]
    Transport { message: String },
    /// The Auth service answered with an unexpected status.
    #[error("auth service returned status {status}: {message}")]
    Upstream { status: u16, message: String },
    /// The Auth service payload failed to decode.
    #[error("auth service payload invalid: {message}")]
    Decode { message: String },
}

impl AuthGatewayError {
    /// Helper for rejected credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Helper for timeouts.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Helper for transport failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for unexpected upstream statuses.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Helper for decode failures.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Outbound gateway to the Auth collaborator.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Resolve a user by identifier.
    async fn fetch_user(&self, id: i32) -> Result<AuthUser, AuthGatewayError>;

    /// Validate a bearer token and return the user it belongs to.
    async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthGatewayError>;
}

/// In-memory vaccine store used without a database and by tests.
#[derive(Debug, Default)]
pub struct InMemoryVaccineRepository {
    entries: Mutex<Vec<Vaccine>>,
}

impl InMemoryVaccineRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaccineRepository for InMemoryVaccineRepository {
    async fn list(&self) -> Result<Vec<Vaccine>, RepositoryError> {
        Ok(self.entries.lock().map_err(poisoned)?.clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Vaccine>, RepositoryError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.iter().find(|v| v.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Vaccine>, RepositoryError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.iter().find(|v| v.name.as_str() == name).cloned())
    }

    async fn insert(&self, vaccine: &NewVaccine) -> Result<Vaccine, RepositoryError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        if entries
            .iter()
            .any(|v| v.name.as_str() == vaccine.name.as_str())
        {
            return Err(RepositoryError::duplicate_key(vaccine.name.as_str()));
        }
        let created = Vaccine {
            id: next_id(entries.iter().map(|v| v.id)),
            name: vaccine.name.clone(),
            doses: vaccine.doses,
        };
        entries.push(created.clone());
        Ok(created)
    }
}

/// In-memory history store used without a database and by tests.
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    entries: Mutex<Vec<VaccinationRecord>>,
}

impl InMemoryHistoryRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(record: &VaccinationRecord, filter: &HistoryFilter) -> bool {
    if filter.user_id.is_some_and(|id| record.user_id != id) {
        return false;
    }
    if filter.vaccine_id.is_some_and(|id| record.vaccine_id != id) {
        return false;
    }
    if filter.status.is_some_and(|status| record.status != status) {
        return false;
    }
    if let Some(range) = filter.applied_within {
        return record
            .applied_on
            .is_some_and(|date| date >= range.start && date <= range.end);
    }
    true
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn list(&self, filter: &HistoryFilter) -> Result<Vec<VaccinationRecord>, RepositoryError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        let mut matching: Vec<VaccinationRecord> = entries
            .iter()
            .filter(|record| matches_filter(record, filter))
            .cloned()
            .collect();
        // Applied records first, newest application date first; then the rest
        // by creation time, mirroring the SQL ordering.
        matching.sort_by(|a, b| match (b.applied_on, a.applied_on) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs).then_with(|| b.created_at.cmp(&a.created_at)),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => b.created_at.cmp(&a.created_at),
        });
        Ok(matching)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<VaccinationRecord>, RepositoryError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.iter().find(|record| record.id == id).cloned())
    }

    async fn insert(
        &self,
        record: &NewVaccinationRecord,
    ) -> Result<VaccinationRecord, RepositoryError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        let created = VaccinationRecord {
            id: next_id(entries.iter().map(|r| r.id)),
            user_id: record.user_id,
            vaccine_id: record.vaccine_id,
            dose_number: record.dose_number,
            status: record.status,
            applied_on: record.applied_on,
            scheduled_for: record.scheduled_for,
            batch: record.batch.clone(),
            site: record.site.clone(),
            professional: record.professional.clone(),
            notes: record.notes.clone(),
            created_at: chrono::Utc::now(),
        };
        entries.push(created.clone());
        Ok(created)
    }
}

/// Auth gateway fixture backed by a static user table.
///
/// Any non-empty token validates against the first registered user, which is
/// enough for handler tests and for running the server without an Auth
/// endpoint configured.
#[derive(Debug, Default)]
pub struct FixtureAuthGateway {
    users: HashMap<i32, AuthUser>,
}

impl FixtureAuthGateway {
    /// Gateway with a single well-known user.
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(
            1,
            AuthUser {
                id: 1,
                name: "Alice Silva".to_owned(),
                email: "alice@example.com".to_owned(),
                is_admin: false,
            },
        );
        Self { users }
    }

    /// Gateway serving exactly the given users.
    pub fn with_users(users: impl IntoIterator<Item = AuthUser>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn fetch_user(&self, id: i32) -> Result<AuthUser, AuthGatewayError> {
        self.users.get(&id).cloned().ok_or(AuthGatewayError::NotFound)
    }

    async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthGatewayError> {
        if token.trim().is_empty() {
            return Err(AuthGatewayError::unauthorized("empty token"));
        }
        self.users
            .values()
            .min_by_key(|u| u.id)
            .cloned()
            .ok_or_else(|| AuthGatewayError::unauthorized("no users registered"))
    }
}

fn next_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().unwrap_or(0) + 1
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::query("in-memory store lock poisoned")
}
