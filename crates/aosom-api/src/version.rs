// Server API version
//
// `GET /api/versions/api` reports strings such as "1.0", "1.1" or "2.1.0".
// Partial versions are padded with zeros so they compare as semver.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Servers newer than this wrap list responses as `{"items": [...]}`.
const BARE_LIST_MAX: semver::Version = semver::Version::new(1, 0, 0);

/// Version reported by the AOS-server API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    raw: String,
    semantic: semver::Version,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        let semantic = match semver::Version::parse(trimmed) {
            Ok(v) => v,
            Err(full_err) => parse_partial(trimmed).ok_or_else(|| Error::InvalidVersion {
                version: raw.to_owned(),
                reason: full_err.to_string(),
            })?,
        };
        Ok(Self {
            raw: trimmed.to_owned(),
            semantic,
        })
    }

    /// The version string exactly as the server reported it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn semantic(&self) -> &semver::Version {
        &self.semantic
    }

    /// Whether list endpoints on this server wrap records in `items`.
    pub fn wraps_lists(&self) -> bool {
        self.semantic > BARE_LIST_MAX
    }
}

/// "1" or "1.0" -> 1.0.0. Anything else is rejected.
fn parse_partial(raw: &str) -> Option<semver::Version> {
    let mut parts = raw.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(semver::Version::new(major, minor, 0))
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
