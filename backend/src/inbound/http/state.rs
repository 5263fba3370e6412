//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data`, so they depend only on
//! domain services and ports and stay testable without real I/O.

use std::sync::Arc;

use crate::domain::ports::{AuthGateway, HistoryRepository, VaccineRepository};
use crate::domain::{HistoryService, UserDirectoryService, VaccineService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub vaccines: VaccineService,
    pub history: HistoryService,
    pub users: UserDirectoryService,
    pub auth: Arc<dyn AuthGateway>,
}

impl HttpState {
    /// Wire the services over the given adapters.
    pub fn new(
        vaccine_repo: Arc<dyn VaccineRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        auth: Arc<dyn AuthGateway>,
    ) -> Self {
        Self {
            vaccines: VaccineService::new(vaccine_repo.clone()),
            history: HistoryService::new(history_repo, vaccine_repo),
            users: UserDirectoryService::new(auth.clone()),
            auth,
        }
    }

    /// State backed entirely by in-memory fixtures, for tests and for running
    /// without external dependencies.
    pub fn fixture() -> Self {
        use crate::domain::ports::{
            FixtureAuthGateway, InMemoryHistoryRepository, InMemoryVaccineRepository,
        };
        Self::new(
            Arc::new(InMemoryVaccineRepository::new()),
            Arc::new(InMemoryHistoryRepository::new()),
            Arc::new(FixtureAuthGateway::new()),
        )
    }
}
