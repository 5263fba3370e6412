//! Backend entry-point: configuration from the environment, migrations, and
//! server startup.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use tracing::{error, info, warn};
use url::Url;
use tracing_subscriber::{EnvFilter, fmt};

use imunetrack::inbound::http::HealthState;
use imunetrack::outbound::auth::AuthHttpGateway;
use imunetrack::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use imunetrack::server::{ServerConfig, create_server};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const MIGRATION_ATTEMPTS: u32 = 10;
const MIGRATION_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let mut config = ServerConfig::new(bind_addr);

    match env::var("DATABASE_URL") {
        Ok(database_url) => {
            migrate_with_retry(&database_url).await?;
            let pool = DbPool::connect(pool_config(&database_url)?)
                .await
                .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
            config = config.with_db_pool(pool);
        }
        Err(_) => warn!("DATABASE_URL not set, running against in-memory stores"),
    }

    match env::var("AUTH_SERVICE_URL") {
        Ok(raw) => {
            let base_url = Url::parse(&raw)
                .map_err(|e| std::io::Error::other(format!("invalid AUTH_SERVICE_URL: {e}")))?;
            let gateway = AuthHttpGateway::new(base_url)
                .map_err(|e| std::io::Error::other(format!("auth client: {e}")))?;
            config = config.with_auth_gateway(Arc::new(gateway));
        }
        Err(_) => warn!("AUTH_SERVICE_URL not set, using fixture auth gateway"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    let server = create_server(health_state, config)?;
    server.await
}

/// Pool configuration, sized by `DATABASE_POOL_SIZE` when set.
fn pool_config(database_url: &str) -> std::io::Result<PoolConfig> {
    sized_pool_config(database_url, env::var("DATABASE_POOL_SIZE").ok().as_deref())
}

fn sized_pool_config(database_url: &str, size: Option<&str>) -> std::io::Result<PoolConfig> {
    let mut config = PoolConfig::new(database_url);
    if let Some(raw) = size {
        let size: u32 = raw
            .parse()
            .map_err(|e| std::io::Error::other(format!("invalid DATABASE_POOL_SIZE: {e}")))?;
        config = config.with_max_connections(size);
    }
    Ok(config)
}

/// Apply migrations, retrying while the database comes up.
///
/// Container deployments start the database and the service together, so the
/// first attempts routinely race the database's startup.
async fn migrate_with_retry(database_url: &str) -> std::io::Result<()> {
    let mut attempt = 1;
    loop {
        match run_migrations(database_url).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MIGRATION_ATTEMPTS => {
                warn!(attempt, error = %e, "migrations failed, retrying");
                tokio::time::sleep(MIGRATION_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => {
                error!(error = %e, "migrations failed");
                return Err(std::io::Error::other(format!("migrations: {e}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_override_applies() {
        let config = sized_pool_config("postgres://localhost/imunetrack", Some("4"))
            .expect("valid size");
        assert_eq!(
            config,
            PoolConfig::new("postgres://localhost/imunetrack").with_max_connections(4)
        );
    }

    #[test]
    fn absent_pool_size_keeps_the_default() {
        let config =
            sized_pool_config("postgres://localhost/imunetrack", None).expect("valid config");
        assert_eq!(config, PoolConfig::new("postgres://localhost/imunetrack"));
    }

    #[test]
    fn garbage_pool_size_is_a_startup_error() {
        let err = sized_pool_config("postgres://localhost/imunetrack", Some("lots")).unwrap_err();
        assert!(err.to_string().contains("DATABASE_POOL_SIZE"));
    }
}
