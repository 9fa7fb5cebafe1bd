// src/domain/lib_redirect.rs
//
// LibRedirect rule data: services, their privacy front-ends and the
// user's chosen default per service.

use serde::{Deserialize, Serialize};

/// A site whose links can be rewritten to a privacy front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibRedirectService {
    pub key: String,
    pub name: String,

    /// Regexes matched against the full URL
    pub url_patterns: Vec<String>,

    pub frontends: Vec<LibRedirectFrontend>,

    /// Front-end used when the user has not chosen one
    #[serde(default)]
    pub default_frontend: Option<String>,
}

impl LibRedirectService {
    pub fn frontend(&self, key: &str) -> Option<&LibRedirectFrontend> {
        self.frontends.iter().find(|frontend| frontend.key == key)
    }

    /// Configured default front-end, else the first one listed.
    pub fn fallback_frontend(&self) -> Option<&LibRedirectFrontend> {
        self.default_frontend
            .as_deref()
            .and_then(|key| self.frontend(key))
            .or_else(|| self.frontends.first())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibRedirectFrontend {
    pub key: String,
    pub name: String,

    /// Base URLs ("scheme://host") of public instances
    pub instances: Vec<String>,

    /// JavaScript defining `redirect(url, instance)`; when absent the
    /// instance's scheme and host replace the original ones
    #[serde(default)]
    pub script: Option<String>,
}

/// Persisted front-end and instance choice for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibRedirectDefault {
    pub service_key: String,
    pub frontend_key: String,
    pub instance_url: String,
}

impl LibRedirectDefault {
    pub fn new(service_key: &str, frontend_key: &str, instance_url: &str) -> Self {
        Self {
            service_key: service_key.to_string(),
            frontend_key: frontend_key.to_string(),
            instance_url: instance_url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontend(key: &str) -> LibRedirectFrontend {
        LibRedirectFrontend {
            key: key.to_string(),
            name: key.to_string(),
            instances: vec![format!("https://{}.example", key)],
            script: None,
        }
    }

    #[test]
    fn test_fallback_frontend_prefers_configured_default() {
        let mut service = LibRedirectService {
            key: "youtube".to_string(),
            name: "YouTube".to_string(),
            url_patterns: vec![],
            frontends: vec![frontend("invidious"), frontend("piped")],
            default_frontend: Some("piped".to_string()),
        };
        assert_eq!(service.fallback_frontend().map(|f| f.key.as_str()), Some("piped"));

        service.default_frontend = Some("missing".to_string());
        assert_eq!(service.fallback_frontend().map(|f| f.key.as_str()), Some("invidious"));
    }
}
