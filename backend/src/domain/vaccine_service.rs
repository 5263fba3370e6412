//! Vaccine catalogue use cases.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::error::Error;
use super::ports::{RepositoryError, VaccineRepository};
use super::vaccine::{NewVaccine, Vaccine};

/// Map persistence failures into the domain error vocabulary.
pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::internal(format!("repository unavailable: {message}"))
        }
        RepositoryError::Query { message } => {
            Error::internal(format!("repository error: {message}"))
        }
        RepositoryError::DuplicateKey { message } => {
            Error::conflict(format!("duplicate record: {message}"))
        }
        RepositoryError::ForeignKey { message } => {
            Error::not_found(format!("missing reference: {message}"))
        }
    }
}

/// Service exposing the vaccine catalogue operations.
#[derive(Clone)]
pub struct VaccineService {
    repo: Arc<dyn VaccineRepository>,
}

impl VaccineService {
    /// Create a service over the given repository.
    pub fn new(repo: Arc<dyn VaccineRepository>) -> Self {
        Self { repo }
    }

    /// Return the whole catalogue.
    pub async fn list(&self) -> Result<Vec<Vaccine>, Error> {
        self.repo.list().await.map_err(map_repository_error)
    }

    /// Look up one vaccine, failing with NotFound when absent.
    pub async fn get(&self, id: i32) -> Result<Vaccine, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| vaccine_not_found(id))
    }

    /// Create a catalogue entry, rejecting duplicate names.
    pub async fn create(&self, vaccine: NewVaccine) -> Result<Vaccine, Error> {
        if let Some(existing) = self
            .repo
            .find_by_name(vaccine.name.as_str())
            .await
            .map_err(map_repository_error)?
        {
            return Err(Error::conflict(format!(
                "vaccine named '{}' already exists",
                existing.name
            ))
            .with_details(json!({ "field": "nome", "code": "duplicate_name" })));
        }

        let created = self
            .repo
            .insert(&vaccine)
            .await
            .map_err(map_repository_error)?;
        info!(vaccine_id = created.id, name = %created.name, "vaccine created");
        Ok(created)
    }
}

pub(crate) fn vaccine_not_found(id: i32) -> Error {
    Error::not_found(format!("vaccine {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::InMemoryVaccineRepository;
    use crate::domain::ErrorCode;

    fn service() -> VaccineService {
        VaccineService::new(Arc::new(InMemoryVaccineRepository::new()))
    }

    fn bcg() -> NewVaccine {
        NewVaccine::try_from_parts("BCG", 1).expect("valid vaccine")
    }

    #[tokio::test]
    async fn created_vaccine_appears_in_listing() {
        let service = service();
        let created = service.create(bcg()).await.expect("create succeeds");
        let listed = service.list().await.expect("list succeeds");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let service = service();
        service.create(bcg()).await.expect("first create succeeds");
        let err = service.create(bcg()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.details.expect("details")["code"], "duplicate_name");
    }

    #[tokio::test]
    async fn get_unknown_vaccine_is_not_found() {
        let err = service().get(99).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn get_returns_created_vaccine() {
        let service = service();
        let created = service.create(bcg()).await.expect("create succeeds");
        let fetched = service.get(created.id).await.expect("get succeeds");
        assert_eq!(fetched, created);
    }
}
