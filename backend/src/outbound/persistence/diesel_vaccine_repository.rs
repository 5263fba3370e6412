//! PostgreSQL-backed vaccine catalogue repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, VaccineRepository};
use crate::domain::{NewVaccine, Vaccine};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewVaccineRow, VaccineRow};
use super::pool::DbPool;
use super::schema::vacinas;

/// Diesel-backed implementation of the `VaccineRepository` port.
#[derive(Clone)]
pub struct DieselVaccineRepository {
    pool: DbPool,
}

impl DieselVaccineRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VaccineRepository for DieselVaccineRepository {
    async fn list(&self) -> Result<Vec<Vaccine>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<VaccineRow> = vacinas::table
            .select(VaccineRow::as_select())
            .order(vacinas::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(Vaccine::try_from).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Vaccine>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<VaccineRow> = vacinas::table
            .find(id)
            .select(VaccineRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Vaccine::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Vaccine>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<VaccineRow> = vacinas::table
            .filter(vacinas::nome.eq(name))
            .select(VaccineRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Vaccine::try_from).transpose()
    }

    async fn insert(&self, vaccine: &NewVaccine) -> Result<Vaccine, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: VaccineRow = diesel::insert_into(vacinas::table)
            .values(NewVaccineRow::from(vaccine))
            .returning(VaccineRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Vaccine::try_from(row)
    }
}
