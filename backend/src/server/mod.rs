//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer, web};
use tracing::warn;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{
    AuthGateway, FixtureAuthGateway, HistoryRepository, InMemoryHistoryRepository,
    InMemoryVaccineRepository, VaccineRepository,
};
use crate::inbound::http::{self, HealthState, HttpState};
use crate::middleware::Trace;
use crate::outbound::persistence::{DieselHistoryRepository, DieselVaccineRepository};

/// Build the handler state from the configuration.
///
/// Uses database-backed repositories when a pool is available, otherwise
/// falls back to in-memory stores; likewise for the Auth gateway.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let (vaccines, history): (Arc<dyn VaccineRepository>, Arc<dyn HistoryRepository>) =
        match &config.db_pool {
            Some(pool) => (
                Arc::new(DieselVaccineRepository::new(pool.clone())),
                Arc::new(DieselHistoryRepository::new(pool.clone())),
            ),
            None => {
                warn!("no database pool configured, using in-memory stores");
                (
                    Arc::new(InMemoryVaccineRepository::new()),
                    Arc::new(InMemoryHistoryRepository::new()),
                )
            }
        };

    let auth: Arc<dyn AuthGateway> = match &config.auth_gateway {
        Some(gateway) => gateway.clone(),
        None => {
            warn!("no auth gateway configured, using fixture gateway");
            Arc::new(FixtureAuthGateway::new())
        }
    };

    HttpState::new(vaccines, history, auth)
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .wrap(Trace)
            .wrap(NormalizePath::trim())
            .configure(http::configure);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
