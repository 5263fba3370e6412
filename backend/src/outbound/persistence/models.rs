//! Diesel row models, internal to the persistence layer.
//!
//! Rows mirror the table layout; conversion into domain types revalidates the
//! constrained fields so a row edited outside the application surfaces as a
//! query error instead of a bogus domain value.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    DoseCount, DoseStatus, NewVaccinationRecord, NewVaccine, VaccinationRecord, Vaccine,
    VaccineName,
};

use super::schema::{historico_vacinal, vacinas};

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = vacinas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VaccineRow {
    pub id: i32,
    pub nome: String,
    pub doses: i32,
}

impl TryFrom<VaccineRow> for Vaccine {
    type Error = RepositoryError;

    fn try_from(row: VaccineRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let name = VaccineName::new(row.nome)
            .map_err(|e| invalid_row("vacinas", id, e))?;
        let doses = DoseCount::new(row.doses)
            .map_err(|e| invalid_row("vacinas", id, e))?;
        Ok(Self { id, name, doses })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vacinas)]
pub struct NewVaccineRow<'a> {
    pub nome: &'a str,
    pub doses: i32,
}

impl<'a> From<&'a NewVaccine> for NewVaccineRow<'a> {
    fn from(vaccine: &'a NewVaccine) -> Self {
        Self {
            nome: vaccine.name.as_str(),
            doses: vaccine.doses.get(),
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = historico_vacinal)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    pub id: i32,
    pub usuario_id: i32,
    pub vacina_id: i32,
    pub numero_dose: i32,
    pub status: String,
    pub data_aplicacao: Option<NaiveDate>,
    pub data_prevista: Option<NaiveDate>,
    pub lote: Option<String>,
    pub local_aplicacao: Option<String>,
    pub profissional: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for VaccinationRecord {
    type Error = RepositoryError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<DoseStatus>()
            .map_err(|e| invalid_row("historico_vacinal", row.id, e))?;
        Ok(Self {
            id: row.id,
            user_id: row.usuario_id,
            vaccine_id: row.vacina_id,
            dose_number: row.numero_dose,
            status,
            applied_on: row.data_aplicacao,
            scheduled_for: row.data_prevista,
            batch: row.lote,
            site: row.local_aplicacao,
            professional: row.profissional,
            notes: row.observacoes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = historico_vacinal)]
pub struct NewHistoryRow<'a> {
    pub usuario_id: i32,
    pub vacina_id: i32,
    pub numero_dose: i32,
    pub status: &'a str,
    pub data_aplicacao: Option<NaiveDate>,
    pub data_prevista: Option<NaiveDate>,
    pub lote: Option<&'a str>,
    pub local_aplicacao: Option<&'a str>,
    pub profissional: Option<&'a str>,
    pub observacoes: Option<&'a str>,
}

impl<'a> From<&'a NewVaccinationRecord> for NewHistoryRow<'a> {
    fn from(record: &'a NewVaccinationRecord) -> Self {
        Self {
            usuario_id: record.user_id,
            vacina_id: record.vaccine_id,
            numero_dose: record.dose_number,
            status: record.status.as_str(),
            data_aplicacao: record.applied_on,
            data_prevista: record.scheduled_for,
            lote: record.batch.as_deref(),
            local_aplicacao: record.site.as_deref(),
            profissional: record.professional.as_deref(),
            observacoes: record.notes.as_deref(),
        }
    }
}

fn invalid_row(table: &str, id: i32, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::query(format!("invalid {table} row {id}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vaccine_row_converts_to_domain() {
        let row = VaccineRow {
            id: 3,
            nome: "BCG".to_owned(),
            doses: 1,
        };
        let vaccine = Vaccine::try_from(row).expect("valid row");
        assert_eq!(vaccine.id, 3);
        assert_eq!(vaccine.name.as_str(), "BCG");
    }

    #[test]
    fn out_of_range_doses_surface_as_query_error() {
        let row = VaccineRow {
            id: 3,
            nome: "BCG".to_owned(),
            doses: 0,
        };
        let err = Vaccine::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::Query { .. }));
    }

    #[test]
    fn unknown_status_surfaces_as_query_error() {
        let row = HistoryRow {
            id: 9,
            usuario_id: 1,
            vacina_id: 1,
            numero_dose: 1,
            status: "applied".to_owned(),
            data_aplicacao: None,
            data_prevista: None,
            lote: None,
            local_aplicacao: None,
            profissional: None,
            observacoes: None,
            created_at: Utc::now(),
        };
        let err = VaccinationRecord::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::Query { .. }));
    }
}
