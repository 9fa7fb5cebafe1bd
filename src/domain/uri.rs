// src/domain/uri.rs
//
// Uri value object
//
// An absolute, immutable resource identifier. Every Uri that exists carries
// both a scheme and a non-empty host; construction fails otherwise.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    url: Url,
}

impl Uri {
    /// Parse a string into a Uri, requiring scheme and host.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| DomainError::InvalidUri(format!("{}: {}", input, e)))?;
        Self::from_url(url)
    }

    pub fn from_url(url: Url) -> DomainResult<Self> {
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self { url }),
            _ => Err(DomainError::InvalidUri(format!(
                "{} has no host",
                url.as_str()
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host is guaranteed present by construction.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_http(&self) -> bool {
        matches!(self.scheme(), "http" | "https")
    }

    /// Last non-empty path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    }

    /// Resolve a possibly relative reference against this Uri.
    pub fn join(&self, reference: &str) -> DomainResult<Self> {
        let joined = self
            .url
            .join(reference)
            .map_err(|e| DomainError::InvalidUri(format!("{}: {}", reference, e)))?;
        Self::from_url(joined)
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Uri {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uri::parse(&raw).map_err(serde::de::Error::custom)
    }
}
