//! Configuration for AOS-server sessions.
//!
//! TOML profiles, the `AOS_*` environment variables, and password
//! resolution (env + plaintext + keyring), translated into an
//! `aosom_api::SessionConfig`. The CLI layers its flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use aosom_api::{DEFAULT_PORT, SessionConfig, TransportConfig};

/// Service name under which passwords are kept in the system keyring.
pub const KEYRING_SERVICE: &str = "aosom";

/// Environment variables understood by every aosom tool.
pub mod env {
    pub const SERVER: &str = "AOS_SERVER";
    pub const SERVER_PORT: &str = "AOS_SERVER_PORT";
    pub const USER: &str = "AOS_USER";
    pub const PASSWD: &str = "AOS_PASSWD";
    pub const SESSION_TOKEN: &str = "AOS_SESSION_TOKEN";
}

const DEFAULT_USER: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Copy with passwords and tokens masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for profile in copy.profiles.values_mut() {
            if profile.password.is_some() {
                profile.password = Some("****".into());
            }
            if profile.token.is_some() {
                profile.token = Some("****".into());
            }
        }
        copy
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Reachability probe deadline, seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_probe_timeout() -> u64 {
    5
}

/// A named AOS-server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server host name or address.
    pub server: Option<String>,

    /// API port (8888 when unset).
    pub port: Option<u16>,

    pub user: Option<String>,

    /// Password (plaintext; prefer the keyring or `AOS_PASSWD`).
    pub password: Option<String>,

    /// Session token from an earlier login.
    pub token: Option<String>,

    /// Override of `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Environment ─────────────────────────────────────────────────────

/// Values taken from the `AOS_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = get(env::SERVER_PORT)
            .map(|raw| {
                raw.parse::<u16>().map_err(|e| ConfigError::Validation {
                    field: env::SERVER_PORT.into(),
                    reason: format!("'{raw}': {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            server: get(env::SERVER),
            port,
            user: get(env::USER),
            password: get(env::PASSWD),
            token: get(env::SESSION_TOKEN),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "aosom", "aosom").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aosom");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `AOSOM_*` overrides
/// (`AOSOM_DEFAULTS__OUTPUT=json`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AOSOM_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile & credential resolution ─────────────────────────────────

/// Name of the profile to use: the requested one, else the configured
/// default, else `"default"`.
pub fn active_profile_name(requested: Option<&str>, cfg: &Config) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Look up the active profile. An explicitly requested profile must
/// exist; a missing default profile is fine (env and flags may be enough).
pub fn select_profile<'a>(
    requested: Option<&str>,
    cfg: &'a Config,
) -> Result<(String, Option<&'a Profile>), ConfigError> {
    let name = active_profile_name(requested, cfg);
    match (cfg.profiles.get(&name), requested) {
        (Some(profile), _) => Ok((name, Some(profile))),
        (None, None) => Ok((name, None)),
        (None, Some(_)) => Err(ConfigError::ProfileNotFound {
            available: cfg.profile_names().join(", "),
            name,
        }),
    }
}

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Password for a profile: `AOS_PASSWD`, then the profile's plaintext
/// password, then the system keyring, then the factory default.
pub fn resolve_password(
    profile: Option<&Profile>,
    profile_name: &str,
    env: &EnvOverrides,
) -> SecretString {
    // 1. Env var
    if let Some(ref pw) = env.password {
        return SecretString::from(pw.clone());
    }

    // 2. Plaintext in config
    if let Some(pw) = profile.and_then(|p| p.password.as_ref()) {
        return SecretString::from(pw.clone());
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return SecretString::from(pw);
        }
    }

    SecretString::from(DEFAULT_PASSWORD)
}

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Build a `SessionConfig` from a profile and the environment.
///
/// Environment values win over the profile; unset values fall back to
/// port 8888 and user `admin`.
pub fn session_config(
    cfg: &Config,
    profile: Option<&Profile>,
    profile_name: &str,
    env: &EnvOverrides,
) -> Result<SessionConfig, ConfigError> {
    let server = env
        .server
        .clone()
        .or_else(|| profile.and_then(|p| p.server.clone()))
        .filter(|s| !s.is_empty());

    let port = env
        .port
        .or_else(|| profile.and_then(|p| p.port))
        .unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be non-zero".into(),
        });
    }

    let user = env
        .user
        .clone()
        .or_else(|| profile.and_then(|p| p.user.clone()))
        .unwrap_or_else(|| DEFAULT_USER.into());

    let token = env
        .token
        .clone()
        .or_else(|| profile.and_then(|p| p.token.clone()))
        .map(SecretString::from);

    let timeout = profile
        .and_then(|p| p.timeout)
        .unwrap_or(cfg.defaults.timeout);
    let transport = TransportConfig::default()
        .with_timeout(Duration::from_secs(timeout))
        .with_probe_timeout(Duration::from_secs(cfg.defaults.probe_timeout));

    Ok(SessionConfig {
        server,
        port,
        user,
        password: resolve_password(profile, profile_name, env),
        token,
        transport,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 10

[profiles.lab]
server = "aos-lab"
user = "netops"
password = "s3cret"

[profiles.prod]
server = "aos-prod"
port = 443
token = "tok-prod"
timeout = 60
"#;

    fn sample() -> Config {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(SAMPLE))
            .extract()
            .unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> EnvOverrides {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        EnvOverrides::from_lookup(|name| map.get(name).cloned()).unwrap()
    }

    #[test]
    fn extracts_profiles_and_defaults() {
        let cfg = sample();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.probe_timeout, 5);
        assert_eq!(cfg.profile_names(), ["lab", "prod"]);
        assert_eq!(cfg.profiles["prod"].port, Some(443));
    }

    #[test]
    fn profile_values_fill_session_config() {
        let cfg = sample();
        let (name, profile) = select_profile(None, &cfg).unwrap();
        assert_eq!(name, "lab");

        let session = session_config(&cfg, profile, &name, &EnvOverrides::default()).unwrap();
        assert_eq!(session.server.as_deref(), Some("aos-lab"));
        assert_eq!(session.port, 8888);
        assert_eq!(session.user, "netops");
        assert_eq!(session.password.expose_secret(), "s3cret");
        assert!(session.token.is_none());
        assert_eq!(session.transport.timeout, Duration::from_secs(10));
        assert_eq!(session.transport.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_wins_over_profile() {
        let cfg = sample();
        let (name, profile) = select_profile(Some("prod"), &cfg).unwrap();
        let env = vars(&[
            ("AOS_SERVER", "aos-env"),
            ("AOS_SERVER_PORT", "9999"),
            ("AOS_USER", "envuser"),
            ("AOS_PASSWD", "envpass"),
        ]);

        let session = session_config(&cfg, profile, &name, &env).unwrap();
        assert_eq!(session.server.as_deref(), Some("aos-env"));
        assert_eq!(session.port, 9999);
        assert_eq!(session.user, "envuser");
        assert_eq!(session.password.expose_secret(), "envpass");
        assert_eq!(session.token.unwrap().expose_secret(), "tok-prod");
        assert_eq!(session.transport.timeout, Duration::from_secs(60));
    }

    #[test]
    fn bad_port_variable_is_rejected() {
        let result = EnvOverrides::from_lookup(|name| {
            (name == "AOS_SERVER_PORT").then(|| "eighty".to_owned())
        });
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn empty_variables_are_unset() {
        let env = vars(&[("AOS_SERVER", ""), ("AOS_SESSION_TOKEN", "")]);
        assert!(env.server.is_none());
        assert!(env.token.is_none());
    }

    #[test]
    fn requested_profile_must_exist() {
        let cfg = sample();
        match select_profile(Some("staging"), &cfg) {
            Err(ConfigError::ProfileNotFound { name, available }) => {
                assert_eq!(name, "staging");
                assert_eq!(available, "lab, prod");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }

        let empty = Config::default();
        let (name, profile) = select_profile(None, &empty).unwrap();
        assert_eq!(name, "default");
        assert!(profile.is_none());
    }

    #[test]
    fn redacted_masks_secrets() {
        let shown = toml::to_string_pretty(&sample().redacted()).unwrap();
        assert!(!shown.contains("s3cret"), "{shown}");
        assert!(!shown.contains("tok-prod"), "{shown}");
        assert!(shown.contains("****"));
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        save_config_to(&sample(), &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.default_profile.as_deref(), Some("lab"));
        assert_eq!(loaded.profiles["lab"].server.as_deref(), Some("aos-lab"));
    }
}
