// AOS-server API handle
//
// Wraps `reqwest::Client` with the `http://<server>:<port>/api` base URL,
// the auth header obtained at login, and the server API version. All
// resource modules (collections, items, blueprints, devices) issue their
// HTTP calls through the request helpers here so status handling and
// list-shape unwrapping live in one place.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, ErrorResponse};
use crate::poll::{FixedPoll, POLL_INTERVAL};
use crate::record::Record;
use crate::transport::TransportConfig;
use crate::version::ApiVersion;

/// How the session token is presented to the server.
///
/// Older protocol revisions take a bearer-style `authorization` header;
/// current servers expect the `AUTHTOKEN` header handed out by
/// `POST /api/user/login`.
#[derive(Debug, Clone)]
pub enum AuthHeader {
    AuthToken(SecretString),
    Bearer(SecretString),
}

impl AuthHeader {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthToken(_) => "AUTHTOKEN",
            Self::Bearer(_) => "authorization",
        }
    }

    pub fn token(&self) -> &SecretString {
        match self {
            Self::AuthToken(token) | Self::Bearer(token) => token,
        }
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

/// HTTP access to one AOS-server.
///
/// Cheap to clone: `reqwest::Client` is reference counted, so every
/// collection and item carries its own handle.
#[derive(Debug, Clone)]
pub struct Api {
    http: reqwest::Client,
    server: String,
    port: u16,
    url: String,
    auth: Option<AuthHeader>,
    version: Option<ApiVersion>,
    transport: TransportConfig,
}

impl Api {
    /// Create an unauthenticated handle for `http://{server}:{port}/api`.
    pub fn new(server: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let url = format!("http://{server}:{port}/api");
        Url::parse(&url)?;
        Ok(Self {
            http: transport.build_client()?,
            server: server.to_owned(),
            port,
            url,
            auth: None,
            version: None,
            transport: transport.clone(),
        })
    }

    /// Re-attach to a server with a token from a previous login.
    ///
    /// The URL must be the API root (containing `/api`). The server is
    /// probed, its version fetched, and the token validated before the
    /// handle is returned.
    pub async fn resume(
        url: &str,
        auth: AuthHeader,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        if !url.contains("/api") {
            return Err(Error::Authentication {
                message: format!("missing \"/api\" in URL: [{url}]"),
            });
        }

        let parsed = Url::parse(url)?;
        let server = parsed
            .host_str()
            .ok_or(Error::InvalidUrl(url::ParseError::EmptyHost))?
            .to_owned();
        let port = parsed.port_or_known_default().unwrap_or(80);

        let mut api = Self {
            http: transport.build_client()?,
            server,
            port,
            url: url.trim_end_matches('/').to_owned(),
            auth: Some(auth),
            version: None,
            transport: transport.clone(),
        };

        if !api.probe().await {
            return Err(Error::ServerUnreachable {
                server: api.server,
                port: api.port,
            });
        }

        if let Err(e) = api.get_version().await {
            debug!(error = %e, "version fetch failed during resume");
            return Err(Error::Authentication {
                message: format!("unable to get AOS-server version via API: [{url}]"),
            });
        }

        if !api.verify_token().await? {
            return Err(Error::Authentication {
                message: "session token rejected by server".into(),
            });
        }

        debug!(url = %api.url, "resumed session");
        Ok(api)
    }

    /// The API root URL, e.g. `http://aos-server:8888/api`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Server API version, known after `login()` or `resume()`.
    pub fn version(&self) -> Option<&ApiVersion> {
        self.version.as_ref()
    }

    /// The auth header in use, once logged in.
    pub fn auth(&self) -> Option<&AuthHeader> {
        self.auth.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Check the server is IP reachable before any REST call is made.
    ///
    /// Opens (and immediately drops) a TCP connection to the API port,
    /// retrying at a fixed 1s interval until the configured probe deadline.
    pub async fn probe(&self) -> bool {
        let poll = FixedPoll::new(self.transport.probe_timeout, POLL_INTERVAL);
        let addr = (self.server.as_str(), self.port);

        loop {
            match tokio::time::timeout(self.transport.probe_interval, TcpStream::connect(addr))
                .await
            {
                Ok(Ok(_stream)) => {
                    debug!(server = %self.server, port = self.port, "server reachable");
                    return true;
                }
                Ok(Err(e)) => trace!(error = %e, "probe attempt failed"),
                Err(_) => trace!("probe attempt timed out"),
            }

            if !poll.tick().await {
                debug!(server = %self.server, port = self.port, "server unreachable");
                return false;
            }
        }
    }

    /// Exchange username/password for a session token.
    ///
    /// `POST /api/user/login` with `{"username", "password"}`; the returned
    /// `token` is sent as `AUTHTOKEN` on every later call. The server
    /// version is fetched right after.
    pub async fn login(&mut self, user: &str, password: &SecretString) -> Result<(), Error> {
        let url = format!("{}/user/login", self.url);
        debug!(user, "logging in at {}", url);

        let resp = self
            .http
            .post(&url)
            .json(&json!({
                "username": user,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed for user '{user}' (HTTP {status})"),
            });
        }

        let body = resp.text().await?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("login response: {e}"),
                body,
            })?;

        self.auth = Some(AuthHeader::AuthToken(SecretString::from(login.token)));
        self.get_version().await?;
        debug!("login successful");
        Ok(())
    }

    /// Fetch and remember the server API version.
    ///
    /// `GET /api/versions/api` -> `{"version": "..."}`
    pub async fn get_version(&mut self) -> Result<&ApiVersion, Error> {
        let url = format!("{}/versions/api", self.url);
        let body = self.get(&url, "unable to get API version").await?;
        let parsed: VersionResponse =
            serde_json::from_value(body.clone()).map_err(|e| Error::shape(e.to_string(), &body))?;
        let version = ApiVersion::parse(&parsed.version)?;
        debug!(%version, "server API version");
        Ok(self.version.insert(version))
    }

    /// Whether the current token is still accepted (`GET /api/user`).
    pub async fn verify_token(&self) -> Result<bool, Error> {
        let url = format!("{}/user", self.url);
        let resp = self.authorize(self.http.get(&url)).send().await?;
        Ok(resp.status().is_success())
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(auth) => builder.header(auth.name(), auth.token().expose_secret()),
            None => builder,
        }
    }

    /// GET `url` and return the JSON body.
    pub async fn get(&self, url: &str, context: &str) -> Result<Value, Error> {
        debug!("GET {}", url);
        let builder = self.http.get(url);
        self.execute(reqwest::Method::GET, builder, context).await
    }

    /// POST a JSON body to `url` and return the JSON response.
    pub async fn post<B>(&self, url: &str, body: &B, context: &str) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        debug!("POST {}", url);
        let builder = self.http.post(url).json(body);
        self.execute(reqwest::Method::POST, builder, context).await
    }

    /// PUT a JSON body to `url` and return the JSON response.
    pub async fn put<B>(&self, url: &str, body: &B, context: &str) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        debug!("PUT {}", url);
        let builder = self.http.put(url).json(body);
        self.execute(reqwest::Method::PUT, builder, context).await
    }

    /// DELETE `url`.
    pub async fn delete(&self, url: &str, context: &str) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let builder = self.http.delete(url);
        self.execute(reqwest::Method::DELETE, builder, context)
            .await
            .map(|_| ())
    }

    /// Send the request; non-2xx becomes `Error::Request` carrying the
    /// response. An empty 2xx body is returned as `Value::Null`.
    async fn execute(
        &self,
        method: reqwest::Method,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Value, Error> {
        let resp = self.authorize(builder).send().await?;

        if !resp.status().is_success() {
            let response = ErrorResponse::capture(method, resp).await;
            debug!(%response, "request failed");
            return Err(Error::request(context, response));
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    /// Extract the record list from a list-endpoint body.
    ///
    /// Servers newer than 1.0 wrap the list as `{"items": [...]}`; older
    /// ones return the bare array. With no known version either shape is
    /// accepted.
    pub(crate) fn unwrap_list(&self, body: Value) -> Result<Vec<Record>, Error> {
        let wrapped = self.version.as_ref().map(ApiVersion::wraps_lists);

        let list = match (wrapped, body) {
            (Some(true) | None, Value::Object(mut envelope)) => match envelope.remove("items") {
                Some(items) => items,
                None => {
                    return Err(Error::shape(
                        "list response missing 'items'",
                        &Value::Object(envelope),
                    ));
                }
            },
            (Some(false) | None, list @ Value::Array(_)) => list,
            (_, other) => {
                return Err(Error::shape(
                    "list response has unexpected shape for server version",
                    &other,
                ));
            }
        };

        match list {
            Value::Array(values) => values.into_iter().map(crate::record::into_record).collect(),
            other => Err(Error::shape("list 'items' is not an array", &other)),
        }
    }
}

/// At most the first 200 characters of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(200)
        .map_or(body, |(end, _)| &body[..end])
}
