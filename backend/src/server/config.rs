//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use harbor_service::domain::ports::HarborRepository;

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) harbors: Arc<dyn HarborRepository>,
    pub(crate) shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Serve `harbors` on `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, harbors: Arc<dyn HarborRepository>) -> Self {
        Self {
            bind_addr,
            harbors,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Grace period granted to in-flight requests on shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Return the socket address the server will bind to.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Read by server tests to locate the listener")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
