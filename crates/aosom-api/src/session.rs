// ── Session ──
//
// Owns the API handle for one AOS-server plus one `Collection` per
// resource kind. Collections are created on first use and dropped on
// every (re-)login, so no cache outlives the credentials it was built with.

use std::collections::HashMap;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::api::{Api, AuthHeader};
use crate::blueprint::Blueprint;
use crate::collection::Collection;
use crate::device::{ApprovedPool, Device};
use crate::error::Error;
use crate::registry::ResourceKind;
use crate::transport::{DEFAULT_PORT, TransportConfig};
use crate::version::ApiVersion;

/// Connection settings for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: Option<String>,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    /// A token from an earlier login; when set, `login()` resumes with it
    /// instead of exchanging credentials.
    pub token: Option<SecretString>,
    pub transport: TransportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
            user: "admin".into(),
            password: SecretString::from("admin"),
            token: None,
            transport: TransportConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: Some(server.into()),
            ..Self::default()
        }
    }
}

/// A logged-in (or not yet logged-in) connection to one AOS-server.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    api: Option<Api>,
    collections: HashMap<ResourceKind, Collection>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            api: None,
            collections: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.is_some()
    }

    /// Connect and authenticate.
    ///
    /// With a configured token the session is resumed; otherwise the
    /// server is probed for reachability and the user/password exchanged
    /// for a new token.
    pub async fn login(&mut self) -> Result<(), Error> {
        let server = self.config.server.clone().ok_or(Error::NoServer)?;
        self.api = None;
        self.collections.clear();

        let api = if let Some(token) = &self.config.token {
            let url = format!("http://{server}:{}/api", self.config.port);
            debug!(%url, "resuming with configured token");
            Api::resume(&url, AuthHeader::AuthToken(token.clone()), &self.config.transport).await?
        } else {
            let mut api = Api::new(&server, self.config.port, &self.config.transport)?;
            if !api.probe().await {
                return Err(Error::ServerUnreachable {
                    server,
                    port: self.config.port,
                });
            }
            api.login(&self.config.user, &self.config.password).await?;
            api
        };

        info!(
            server = %api.server(),
            version = api.version().map_or("unknown", ApiVersion::as_str),
            "logged in"
        );
        self.api = Some(api);
        Ok(())
    }

    /// Attach to a server using a token from elsewhere (e.g. another
    /// process). `url` is the API root, `http://<server>:<port>/api`.
    pub async fn resume(&mut self, url: &str, auth: AuthHeader) -> Result<(), Error> {
        self.api = None;
        self.collections.clear();
        let api = Api::resume(url, auth, &self.config.transport).await?;
        self.config.server = Some(api.server().to_owned());
        self.config.port = api.port();
        self.api = Some(api);
        Ok(())
    }

    pub fn api(&self) -> Result<&Api, Error> {
        self.api.as_ref().ok_or_else(|| Error::NotLoggedIn {
            server: self.config.server.clone().unwrap_or_default(),
        })
    }

    /// The API root URL of the logged-in server.
    pub fn url(&self) -> Result<&str, Error> {
        self.api().map(Api::url)
    }

    /// The session token, once logged in.
    pub fn token(&self) -> Option<&SecretString> {
        self.api.as_ref().and_then(Api::auth).map(AuthHeader::token)
    }

    /// The session-owned collection for `kind`.
    pub fn collection(&mut self, kind: ResourceKind) -> Result<&mut Collection, Error> {
        let api = self.api()?.clone();
        Ok(self
            .collections
            .entry(kind)
            .or_insert_with(|| Collection::new(api, kind.spec())))
    }

    /// The collection for a registry name such as `IpPools` or `ip_pools`.
    pub fn resource(&mut self, name: &str) -> Result<&mut Collection, Error> {
        let kind = ResourceKind::lookup(name)?;
        self.collection(kind)
    }

    pub async fn blueprint(&mut self, name: &str) -> Result<Blueprint, Error> {
        let item = self.collection(ResourceKind::Blueprints)?.get(name).await?;
        Ok(Blueprint::new(item))
    }

    pub async fn device(&mut self, device_key: &str) -> Result<Device, Error> {
        let item = self.collection(ResourceKind::Devices)?.get(device_key).await?;
        Ok(Device::new(item))
    }

    /// The default approved-device pool.
    pub fn approved_pool(&self) -> Result<ApprovedPool, Error> {
        Ok(ApprovedPool::new(self.api()?.clone()))
    }
}
