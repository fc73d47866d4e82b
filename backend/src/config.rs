//! Service settings loaded via OrthoConfig.
//!
//! Values are layered from CLI flags, `HARBOR_*` environment variables and
//! an optional configuration file. Unset values fall back to the defaults
//! below.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Conventional environment variable consulted when no database URL is
/// configured under the `HARBOR` prefix.
pub const DATABASE_URL_FALLBACK_ENV: &str = "DATABASE_URL";

/// Invalid or missing settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("no database URL configured; set HARBOR_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("invalid listen host '{host}': expected an IP address")]
    InvalidHost { host: String },
}

/// Settings for the harbor service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HARBOR")]
pub struct HarborSettings {
    /// IP address to listen on.
    pub host: Option<String>,
    /// TCP port to listen on.
    pub port: Option<u16>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Serve without applying pending schema migrations first.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout_secs: Option<u64>,
}

impl HarborSettings {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Socket address built from [`host`](Self::host) and [`port`](Self::port).
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidHost`] when the host is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host();
        let ip: IpAddr = host.parse().map_err(|_| SettingsError::InvalidHost {
            host: host.to_owned(),
        })?;
        Ok(SocketAddr::new(ip, self.port()))
    }

    /// Configured database URL, falling back to `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingDatabaseUrl`] when neither is set.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        self.database_url
            .clone()
            .or_else(|| std::env::var(DATABASE_URL_FALLBACK_ENV).ok())
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Whether pending migrations run at startup. True unless
    /// `skip_migrations` is set.
    pub fn run_migrations(&self) -> bool {
        !self.skip_migrations
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }
}
