//! Outbound adapters driven by the domain.

pub mod auth;
pub mod persistence;
