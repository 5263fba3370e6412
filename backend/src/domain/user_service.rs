//! User directory use case proxying the external Auth service.

use std::sync::Arc;

use super::error::Error;
use super::ports::{AuthGateway, AuthGatewayError};
use super::user::AuthUser;

/// Map gateway failures into the domain error vocabulary.
///
/// Everything that makes the collaborator look unavailable, including invalid
/// payloads, is surfaced as a 502-equivalent so callers can distinguish it
/// from local failures.
pub(crate) fn map_gateway_error(error: AuthGatewayError) -> Error {
    match error {
        AuthGatewayError::NotFound => Error::not_found("user not found"),
        AuthGatewayError::Unauthorized { message } => Error::unauthorized(message),
        AuthGatewayError::Timeout { message } => {
            Error::bad_gateway(format!("auth service timed out: {message}"))
        }
        AuthGatewayError::Transport { message } => {
            Error::bad_gateway(format!("auth service unreachable: {message}"))
        }
        AuthGatewayError::Upstream { status, message } => {
            Error::bad_gateway(format!("auth service returned {status}: {message}"))
        }
        AuthGatewayError::Decode { message } => {
            Error::bad_gateway(format!("auth service payload invalid: {message}"))
        }
    }
}

/// Service resolving users through the Auth gateway.
#[derive(Clone)]
pub struct UserDirectoryService {
    gateway: Arc<dyn AuthGateway>,
}

impl UserDirectoryService {
    /// Create a service over the given gateway.
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve a user by identifier, forwarding the Auth service's answer.
    pub async fn get_user(&self, id: i32) -> Result<AuthUser, Error> {
        if id <= 0 {
            return Err(Error::invalid_request("user id must be positive"));
        }
        self.gateway.fetch_user(id).await.map_err(map_gateway_error)
    }
}
