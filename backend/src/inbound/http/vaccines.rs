//! Vaccine catalogue endpoints.
//!
//! The wire format keeps the Portuguese field names (`nome`, `doses`) the
//! API's consumers already speak; translation to domain types happens here.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, NewVaccine, Vaccine};
use crate::inbound::http::auth::require_user;
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::missing_field_error;

/// Payload accepted when creating a vaccine.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VaccineRequest {
    /// Unique vaccine name, at most 100 characters.
    #[schema(example = "Tríplice Viral")]
    pub nome: Option<String>,
    /// Number of doses in the full course, 1 to 10.
    #[schema(example = 2)]
    pub doses: Option<i32>,
}

impl VaccineRequest {
    fn into_domain(self) -> Result<NewVaccine, Error> {
        let nome = self.nome.ok_or_else(|| missing_field_error("nome"))?;
        let doses = self.doses.ok_or_else(|| missing_field_error("doses"))?;
        NewVaccine::try_from_parts(nome, doses).map_err(|e| {
            Error::invalid_request(e.to_string())
                .with_details(serde_json::json!({ "code": "invalid_vaccine" }))
        })
    }
}

/// Vaccine representation returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VaccineResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Tríplice Viral")]
    pub nome: String,
    #[schema(example = 2)]
    pub doses: i32,
}

impl From<Vaccine> for VaccineResponse {
    fn from(vaccine: Vaccine) -> Self {
        Self {
            id: vaccine.id,
            nome: vaccine.name.into(),
            doses: vaccine.doses.into(),
        }
    }
}

/// List the whole vaccine catalogue.
#[utoipa::path(
    get,
    path = "/vacinas",
    tags = ["vacinas"],
    responses(
        (status = 200, description = "All catalogue entries", body = [VaccineResponse]),
        (status = 500, description = "Persistence failure", body = Error)
    )
)]
#[get("/vacinas")]
pub async fn list_vaccines(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let vaccines = state.vaccines.list().await?;
    let body: Vec<VaccineResponse> = vaccines.into_iter().map(VaccineResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch one vaccine by identifier.
#[utoipa::path(
    get,
    path = "/vacinas/{id}",
    tags = ["vacinas"],
    params(("id" = i32, Path, description = "Vaccine identifier")),
    responses(
        (status = 200, description = "The catalogue entry", body = VaccineResponse),
        (status = 404, description = "No vaccine with that identifier", body = Error)
    )
)]
#[get("/vacinas/{id}")]
pub async fn get_vaccine(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let vaccine = state.vaccines.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(VaccineResponse::from(vaccine)))
}

/// Create a catalogue entry. Requires a bearer token.
#[utoipa::path(
    post,
    path = "/vacinas",
    tags = ["vacinas"],
    request_body = VaccineRequest,
    responses(
        (status = 201, description = "Created entry with its identifier", body = VaccineResponse),
        (status = 400, description = "Missing or invalid fields", body = Error),
        (status = 401, description = "Missing or rejected bearer token", body = Error),
        (status = 409, description = "A vaccine with that name already exists", body = Error)
    ),
    security(("bearer_token" = []))
)]
#[post("/vacinas")]
pub async fn create_vaccine(
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<VaccineRequest>,
) -> ApiResult<HttpResponse> {
    require_user(&req, &state).await?;
    let new_vaccine = payload.into_inner().into_domain()?;
    let created = state.vaccines.create(new_vaccine).await?;
    Ok(HttpResponse::Created().json(VaccineResponse::from(created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use serde_json::{Value, json};

    fn app_state() -> web::Data<HttpState> {
        web::Data::new(HttpState::fixture())
    }

    async fn service(
        state: web::Data<HttpState>,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        test::init_service(
            App::new()
                .app_data(state)
                .service(list_vaccines)
                .service(get_vaccine)
                .service(create_vaccine),
        )
        .await
    }

    fn post_vaccine(body: Value) -> actix_http::Request {
        test::TestRequest::post()
            .uri("/vacinas")
            .insert_header((header::AUTHORIZATION, "Bearer test-token"))
            .set_json(body)
            .to_request()
    }

    #[actix_web::test]
    async fn created_vaccine_appears_in_listing() {
        let app = service(app_state()).await;

        let res = test::call_service(&app, post_vaccine(json!({ "nome": "BCG", "doses": 1 }))).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: VaccineResponse = test::read_body_json(res).await;
        assert_eq!(created.nome, "BCG");

        let res = test::call_service(&app, test::TestRequest::get().uri("/vacinas").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let listed: Vec<VaccineResponse> = test::read_body_json(res).await;
        assert_eq!(listed, vec![created]);
    }

    #[actix_web::test]
    async fn create_without_token_is_unauthorized() {
        let app = service(app_state()).await;
        let req = test::TestRequest::post()
            .uri("/vacinas")
            .set_json(json!({ "nome": "BCG", "doses": 1 }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn missing_name_is_a_bad_request() {
        let app = service(app_state()).await;
        let res = test::call_service(&app, post_vaccine(json!({ "doses": 2 }))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "nome");
    }

    #[actix_web::test]
    async fn duplicate_name_is_a_conflict() {
        let app = service(app_state()).await;
        let body = json!({ "nome": "Hepatite B", "doses": 3 });
        let res = test::call_service(&app, post_vaccine(body.clone())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let res = test::call_service(&app, post_vaccine(body)).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn unknown_vaccine_is_not_found() {
        let app = service(app_state()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/vacinas/42").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn get_returns_created_vaccine() {
        let app = service(app_state()).await;
        let res = test::call_service(
            &app,
            post_vaccine(json!({ "nome": "Febre Amarela", "doses": 1 })),
        )
        .await;
        let created: VaccineResponse = test::read_body_json(res).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/vacinas/{}", created.id))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let fetched: VaccineResponse = test::read_body_json(res).await;
        assert_eq!(fetched, created);
    }
}
