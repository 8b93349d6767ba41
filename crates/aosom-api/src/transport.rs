// Shared transport configuration for building reqwest::Client instances.
//
// The session, resumed sessions, and the reachability probe all share the
// same timeout settings through this module.

use std::time::Duration;

use crate::error::Error;

/// Default port of the AOS-server REST API.
pub const DEFAULT_PORT: u16 = 8888;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Overall deadline of the TCP reachability probe run before login.
    pub probe_timeout: Duration,
    /// Per-attempt connect timeout of the reachability probe.
    pub probe_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            probe_interval: Duration::from_secs(1),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("aosom/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
