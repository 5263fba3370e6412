//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::ports::AuthGateway;
use crate::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) auth_gateway: Option<Arc<dyn AuthGateway>>,
}

impl ServerConfig {
    /// Construct a server configuration for the given bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            auth_gateway: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without a pool the server falls back to in-memory stores, which is
    /// only suitable for tests and local experiments.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach an Auth gateway. Without one, a fixture gateway that accepts
    /// any non-empty token is used.
    #[must_use]
    pub fn with_auth_gateway(mut self, gateway: Arc<dyn AuthGateway>) -> Self {
        self.auth_gateway = Some(gateway);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
