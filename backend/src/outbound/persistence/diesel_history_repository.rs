//! PostgreSQL-backed vaccination history repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{HistoryRepository, RepositoryError};
use crate::domain::{HistoryFilter, NewVaccinationRecord, VaccinationRecord};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{HistoryRow, NewHistoryRow};
use super::pool::DbPool;
use super::schema::historico_vacinal;

/// Diesel-backed implementation of the `HistoryRepository` port.
#[derive(Clone)]
pub struct DieselHistoryRepository {
    pool: DbPool,
}

impl DieselHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for DieselHistoryRepository {
    async fn list(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<VaccinationRecord>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = historico_vacinal::table
            .select(HistoryRow::as_select())
            .into_boxed();

        if let Some(user_id) = filter.user_id {
            query = query.filter(historico_vacinal::usuario_id.eq(user_id));
        }
        if let Some(vaccine_id) = filter.vaccine_id {
            query = query.filter(historico_vacinal::vacina_id.eq(vaccine_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(historico_vacinal::status.eq(status.as_str()));
        }
        if let Some(range) = filter.applied_within {
            query = query.filter(
                historico_vacinal::data_aplicacao.between(range.start, range.end),
            );
        }

        let rows: Vec<HistoryRow> = query
            .order((
                historico_vacinal::data_aplicacao.desc().nulls_last(),
                historico_vacinal::created_at.desc(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(VaccinationRecord::try_from).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<VaccinationRecord>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<HistoryRow> = historico_vacinal::table
            .find(id)
            .select(HistoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(VaccinationRecord::try_from).transpose()
    }

    async fn insert(
        &self,
        record: &NewVaccinationRecord,
    ) -> Result<VaccinationRecord, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: HistoryRow = diesel::insert_into(historico_vacinal::table)
            .values(NewHistoryRow::from(record))
            .returning(HistoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        VaccinationRecord::try_from(row)
    }
}
