//! ImuneTrack backend library modules.
//!
//! The crate follows a hexagonal layout: `domain` holds entities, ports, and
//! services; `inbound` and `outbound` hold the HTTP and persistence/Auth
//! adapters; `server` wires everything into an Actix application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
