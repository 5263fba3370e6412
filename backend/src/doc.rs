//! OpenAPI documentation configuration.
//!
//! Generates the specification served by Swagger UI in debug builds. Paths
//! and schemas reference the inbound DTOs directly; the domain types stay
//! free of utoipa coupling apart from the shared error payload.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::history::{
    HistoryRequest, HistoryResponse, StatisticsResponse, UpcomingDoseResponse,
};
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::vaccines::{VaccineRequest, VaccineResponse};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Token issued and validated by the Auth service."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "ImuneTrack API",
        description = "Vaccine catalogue and vaccination history tracking."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::vaccines::list_vaccines,
        crate::inbound::http::vaccines::get_vaccine,
        crate::inbound::http::vaccines::create_vaccine,
        crate::inbound::http::history::list_history,
        crate::inbound::http::history::get_history_statistics,
        crate::inbound::http::history::get_history_record,
        crate::inbound::http::history::create_history,
        crate::inbound::http::users::get_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        VaccineRequest,
        VaccineResponse,
        HistoryRequest,
        HistoryResponse,
        StatisticsResponse,
        UpcomingDoseResponse,
        UserResponse,
        Error,
        ErrorCode,
    )),
    tags(
        (name = "vacinas", description = "Vaccine catalogue"),
        (name = "historico", description = "Vaccination history"),
        (name = "usuarios", description = "User lookups proxied to the Auth service"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_registers_all_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/vacinas",
            "/vacinas/{id}",
            "/historico",
            "/historico/estatisticas",
            "/historico/{id}",
            "/usuarios/{id}",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains(&expected), "missing path: {expected}");
        }
    }

    #[test]
    fn document_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components present");
        assert!(components.security_schemes.contains_key("bearer_token"));
    }
}
