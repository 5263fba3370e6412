//! Outbound adapter for the external Auth service.

mod dto;
mod http_gateway;

pub use http_gateway::AuthHttpGateway;
