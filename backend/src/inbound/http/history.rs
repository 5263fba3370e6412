//! Vaccination history endpoints.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, HistoryListRequest, HistoryStatistics, NewVaccinationRecord, UpcomingDose,
    VaccinationRecord,
};
use crate::inbound::http::auth::require_user;
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_status};

/// Payload accepted when registering a dose.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HistoryRequest {
    /// Identifier of the user, owned by the Auth service.
    #[schema(example = 1)]
    pub usuario_id: Option<i32>,
    /// Identifier of the catalogue vaccine.
    #[schema(example = 1)]
    pub vacina_id: Option<i32>,
    /// Position of this dose in the course, starting at 1.
    #[schema(example = 2)]
    pub numero_dose: Option<i32>,
    /// Dose status; defaults to `pendente` when omitted.
    #[schema(example = "aplicada")]
    pub status: Option<String>,
    /// Date the dose was administered.
    pub data_aplicacao: Option<NaiveDate>,
    /// Date the dose is scheduled for.
    pub data_prevista: Option<NaiveDate>,
    /// Manufacturer batch.
    pub lote: Option<String>,
    /// Clinic or site of application.
    pub local_aplicacao: Option<String>,
    /// Professional who administered the dose.
    pub profissional: Option<String>,
    /// Free-text notes.
    pub observacoes: Option<String>,
}

impl HistoryRequest {
    fn into_domain(self) -> Result<NewVaccinationRecord, Error> {
        let status = match self.status {
            Some(raw) => parse_status(&raw, "status")?,
            None => Default::default(),
        };
        Ok(NewVaccinationRecord {
            user_id: self.usuario_id.ok_or_else(|| missing_field_error("usuario_id"))?,
            vaccine_id: self.vacina_id.ok_or_else(|| missing_field_error("vacina_id"))?,
            dose_number: self
                .numero_dose
                .ok_or_else(|| missing_field_error("numero_dose"))?,
            status,
            applied_on: self.data_aplicacao,
            scheduled_for: self.data_prevista,
            batch: self.lote,
            site: self.local_aplicacao,
            professional: self.profissional,
            notes: self.observacoes,
        })
    }
}

/// History record representation returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub usuario_id: i32,
    #[schema(example = 1)]
    pub vacina_id: i32,
    #[schema(example = 2)]
    pub numero_dose: i32,
    #[schema(example = "aplicada")]
    pub status: String,
    pub data_aplicacao: Option<NaiveDate>,
    pub data_prevista: Option<NaiveDate>,
    pub lote: Option<String>,
    pub local_aplicacao: Option<String>,
    pub profissional: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VaccinationRecord> for HistoryResponse {
    fn from(record: VaccinationRecord) -> Self {
        Self {
            id: record.id,
            usuario_id: record.user_id,
            vacina_id: record.vaccine_id,
            numero_dose: record.dose_number,
            status: record.status.as_str().to_owned(),
            data_aplicacao: record.applied_on,
            data_prevista: record.scheduled_for,
            lote: record.batch,
            local_aplicacao: record.site,
            profissional: record.professional,
            observacoes: record.notes,
            created_at: record.created_at,
        }
    }
}

/// Query parameters accepted when listing history.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Restrict to one user's records.
    pub usuario_id: Option<i32>,
    /// Restrict to one vaccine's records.
    pub vacina_id: Option<i32>,
    /// Restrict to records with this status.
    pub status: Option<String>,
    /// Restrict to records applied in this year.
    pub ano: Option<i32>,
    /// Restrict to records applied in this month, 1 to 12. Requires `ano`.
    #[param(value_type = Option<u32>)]
    pub mes: Option<String>,
}

impl HistoryQuery {
    // `mes` arrives as a string so that garbage values surface the error
    // envelope instead of the framework's deserialisation body.
    fn into_domain(self) -> Result<HistoryListRequest, Error> {
        let status = match self.status {
            Some(raw) => Some(parse_status(&raw, "status")?),
            None => None,
        };
        let month = match self.mes.as_deref() {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                Error::invalid_request(format!("invalid month: {raw}"))
                    .with_details(json!({ "field": "mes", "code": "invalid_month" }))
            })?),
            None => None,
        };
        Ok(HistoryListRequest {
            user_id: self.usuario_id,
            vaccine_id: self.vacina_id,
            status,
            year: self.ano,
            month,
        })
    }
}

/// Query parameters accepted by the statistics summary.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    /// User whose history is summarised.
    pub usuario_id: Option<i32>,
}

/// A scheduled dose listed in the statistics summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpcomingDoseResponse {
    #[schema(example = "Hepatite B")]
    pub vacina: String,
    #[schema(example = 2)]
    pub dose: i32,
    pub data_prevista: NaiveDate,
}

/// Aggregated history figures for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub total_doses: usize,
    pub doses_aplicadas: usize,
    pub doses_pendentes: usize,
    pub doses_atrasadas: usize,
    pub doses_canceladas: usize,
    pub vacinas_completas: usize,
    pub vacinas_incompletas: usize,
    pub proximas_doses: Vec<UpcomingDoseResponse>,
}

impl From<HistoryStatistics> for StatisticsResponse {
    fn from(stats: HistoryStatistics) -> Self {
        Self {
            total_doses: stats.total_doses,
            doses_aplicadas: stats.applied,
            doses_pendentes: stats.pending,
            doses_atrasadas: stats.overdue,
            doses_canceladas: stats.cancelled,
            vacinas_completas: stats.complete_vaccines,
            vacinas_incompletas: stats.incomplete_vaccines,
            proximas_doses: stats
                .upcoming
                .into_iter()
                .map(UpcomingDoseResponse::from)
                .collect(),
        }
    }
}

impl From<UpcomingDose> for UpcomingDoseResponse {
    fn from(dose: UpcomingDose) -> Self {
        Self {
            vacina: dose.vaccine_name,
            dose: dose.dose_number,
            data_prevista: dose.scheduled_for,
        }
    }
}

/// List vaccination records, optionally filtered.
#[utoipa::path(
    get,
    path = "/historico",
    tags = ["historico"],
    params(HistoryQuery),
    responses(
        (status = 200, description = "Matching records, most recent application first", body = [HistoryResponse]),
        (status = 400, description = "Invalid filter combination", body = Error)
    )
)]
#[get("/historico")]
pub async fn list_history(
    state: web::Data<HttpState>,
    query: web::Query<HistoryQuery>,
) -> ApiResult<HttpResponse> {
    let request = query.into_inner().into_domain()?;
    let records = state.history.list(request).await?;
    let body: Vec<HistoryResponse> = records.into_iter().map(HistoryResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Summarise a user's vaccination history.
#[utoipa::path(
    get,
    path = "/historico/estatisticas",
    tags = ["historico"],
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Dose counts, course completion and next scheduled doses", body = StatisticsResponse),
        (status = 400, description = "Missing or invalid usuario_id", body = Error)
    )
)]
#[get("/historico/estatisticas")]
pub async fn get_history_statistics(
    state: web::Data<HttpState>,
    query: web::Query<StatisticsQuery>,
) -> ApiResult<HttpResponse> {
    let user_id = query
        .into_inner()
        .usuario_id
        .ok_or_else(|| missing_field_error("usuario_id"))?;
    let stats = state.history.statistics(user_id).await?;
    Ok(HttpResponse::Ok().json(StatisticsResponse::from(stats)))
}

/// Fetch one history record by identifier.
#[utoipa::path(
    get,
    path = "/historico/{id}",
    tags = ["historico"],
    params(("id" = i32, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "The record", body = HistoryResponse),
        (status = 404, description = "No record with that identifier", body = Error)
    )
)]
#[get("/historico/{id}")]
pub async fn get_history_record(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let record = state.history.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(HistoryResponse::from(record)))
}

/// Register a dose in a user's history. Requires a bearer token.
#[utoipa::path(
    post,
    path = "/historico",
    tags = ["historico"],
    request_body = HistoryRequest,
    responses(
        (status = 201, description = "Created record with its identifier", body = HistoryResponse),
        (status = 400, description = "Missing fields or dose outside the course", body = Error),
        (status = 401, description = "Missing or rejected bearer token", body = Error),
        (status = 404, description = "Referenced vaccine does not exist", body = Error)
    ),
    security(("bearer_token" = []))
)]
#[post("/historico")]
pub async fn create_history(
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<HistoryRequest>,
) -> ApiResult<HttpResponse> {
    require_user(&req, &state).await?;
    let record = payload.into_inner().into_domain()?;
    let created = state.history.create(record).await?;
    Ok(HttpResponse::Created().json(HistoryResponse::from(created)))
}
