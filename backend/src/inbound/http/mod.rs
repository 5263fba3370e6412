//! HTTP adapter: handlers, DTOs, and error mapping.
//!
//! Handlers translate between the JSON wire format and domain types and
//! delegate all behaviour to the services in [`crate::domain`].

pub mod auth;
pub mod error;
pub mod health;
pub mod history;
pub mod state;
pub mod users;
pub mod vaccines;
mod validation;

use actix_web::web;

pub use self::error::ApiResult;
pub use self::health::HealthState;
pub use self::state::HttpState;

/// Register every API route on the given service config.
///
/// The caller supplies [`HttpState`] and [`HealthState`] via `app_data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::live)
        .service(health::ready)
        .service(vaccines::list_vaccines)
        .service(vaccines::get_vaccine)
        .service(vaccines::create_vaccine)
        .service(history::list_history)
        // The fixed segment must win over the `{id}` matcher.
        .service(history::get_history_statistics)
        .service(history::get_history_record)
        .service(history::create_history)
        .service(users::get_user);
}
