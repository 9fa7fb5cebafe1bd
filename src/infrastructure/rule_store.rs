// src/infrastructure/rule_store.rs
//
// Rule tables for link modification and LibRedirect
//
// CRITICAL RULES:
// - Built once at startup and shared through Arc
// - Immutable after construction
// - Every pattern is compiled up front; a bad pattern fails construction

use std::collections::{BTreeSet, HashMap};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::domain::LibRedirectService;
use crate::error::{AppError, AppResult};

const CLEAR_URLS_JSON: &str = include_str!("../../rules/clearurls.json");
const EMBEDS_JSON: &str = include_str!("../../rules/embeds.json");
const FAST_FORWARD_JSON: &str = include_str!("../../rules/fastforward.json");
const LIB_REDIRECT_JSON: &str = include_str!("../../rules/libredirect.json");

// ============================================================================
// RAW (ON-DISK) FORMATS
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawClearUrls {
    providers: HashMap<String, RawClearUrlsProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClearUrlsProvider {
    url_pattern: String,
    #[serde(default)]
    complete_provider: bool,
    #[serde(default)]
    rules: Vec<String>,
    #[serde(default)]
    raw_rules: Vec<String>,
    #[serde(default)]
    exceptions: Vec<String>,
    #[serde(default)]
    redirections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEmbeds {
    embeds: Vec<EmbedRule>,
}

#[derive(Debug, Deserialize)]
struct RawFastForward {
    rules: Vec<RawFastForwardRule>,
    #[serde(default)]
    trackers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawFastForwardRule {
    name: String,
    pattern: String,
    param: String,
}

#[derive(Debug, Deserialize)]
struct RawLibRedirect {
    services: Vec<LibRedirectService>,
}

// ============================================================================
// COMPILED RULES
// ============================================================================

/// One ClearURLs provider.
#[derive(Debug, Clone)]
pub struct ClearUrlsProvider {
    pub name: String,
    pub url_pattern: Regex,

    /// Blocks the whole site; the modifier leaves such URLs untouched
    pub complete_provider: bool,

    /// Anchored, case-insensitive matchers for query/fragment field names
    pub rules: Vec<Regex>,

    /// Removed from the whole URL string
    pub raw_rules: Vec<Regex>,

    pub exceptions: Vec<Regex>,

    /// First capture group holds the percent-encoded target
    pub redirections: Vec<Regex>,
}

impl ClearUrlsProvider {
    pub fn applies_to(&self, url: &str) -> bool {
        self.url_pattern.is_match(url) && !self.exceptions.iter().any(|e| e.is_match(url))
    }
}

/// Embed-proxy hosts that stand in for `target`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedRule {
    pub name: String,
    pub hosts: Vec<String>,
    pub target: String,
}

/// Tracking redirect that carries its destination in a query parameter.
#[derive(Debug, Clone)]
pub struct FastForwardRule {
    pub name: String,
    pub pattern: Regex,
    pub param: String,
}

#[derive(Debug, Clone)]
pub struct CompiledLibRedirectService {
    pub service: LibRedirectService,
    pub patterns: Vec<Regex>,
}

impl CompiledLibRedirectService {
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }
}

// ============================================================================
// RULE STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    clear_urls: Vec<ClearUrlsProvider>,
    embeds: Vec<EmbedRule>,
    fast_forward: Vec<FastForwardRule>,
    trackers: BTreeSet<String>,
    lib_redirect: Vec<CompiledLibRedirectService>,
}

fn compile(pattern: &str, case_insensitive: bool) -> AppResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| AppError::Other(format!("Invalid rule pattern '{}': {}", pattern, e)))
}

fn compile_all(patterns: &[String], case_insensitive: bool) -> AppResult<Vec<Regex>> {
    patterns.iter().map(|p| compile(p, case_insensitive)).collect()
}

impl RuleStore {
    /// Rule tables bundled with the crate
    pub fn embedded() -> AppResult<Self> {
        Self::from_json(CLEAR_URLS_JSON, EMBEDS_JSON, FAST_FORWARD_JSON, LIB_REDIRECT_JSON)
    }

    pub fn from_json(clear_urls: &str, embeds: &str, fast_forward: &str, lib_redirect: &str) -> AppResult<Self> {
        let raw_clear_urls: RawClearUrls = serde_json::from_str(clear_urls)?;
        let raw_embeds: RawEmbeds = serde_json::from_str(embeds)?;
        let raw_fast_forward: RawFastForward = serde_json::from_str(fast_forward)?;
        let raw_lib_redirect: RawLibRedirect = serde_json::from_str(lib_redirect)?;

        let mut providers = raw_clear_urls.providers.into_iter().collect::<Vec<_>>();
        // globalRules last, site providers by name: HashMap order is not stable
        providers.sort_by(|(a, _), (b, _)| (a == "globalRules", a).cmp(&(b == "globalRules", b)));

        let clear_urls = providers
            .into_iter()
            .map(|(name, raw)| {
                let rules = raw
                    .rules
                    .iter()
                    .map(|rule| compile(&format!("^(?:{})$", rule), true))
                    .collect::<AppResult<Vec<_>>>()?;

                Ok(ClearUrlsProvider {
                    url_pattern: compile(&raw.url_pattern, true)?,
                    complete_provider: raw.complete_provider,
                    rules,
                    raw_rules: compile_all(&raw.raw_rules, true)?,
                    exceptions: compile_all(&raw.exceptions, true)?,
                    redirections: compile_all(&raw.redirections, true)?,
                    name,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let fast_forward = raw_fast_forward
            .rules
            .into_iter()
            .map(|raw| {
                Ok(FastForwardRule {
                    pattern: compile(&raw.pattern, true)?,
                    name: raw.name,
                    param: raw.param,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let lib_redirect = raw_lib_redirect
            .services
            .into_iter()
            .map(|service| {
                Ok(CompiledLibRedirectService {
                    patterns: compile_all(&service.url_patterns, true)?,
                    service,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let trackers = raw_fast_forward
            .trackers
            .into_iter()
            .map(|host| host.to_lowercase())
            .collect();

        log::debug!(
            "Loaded rules: {} ClearURLs providers, {} embeds, {} FastForward rules, {} LibRedirect services",
            clear_urls.len(),
            raw_embeds.embeds.len(),
            fast_forward.len(),
            lib_redirect.len()
        );

        Ok(Self {
            clear_urls,
            embeds: raw_embeds.embeds,
            fast_forward,
            trackers,
            lib_redirect,
        })
    }

    pub fn clear_urls_providers(&self) -> &[ClearUrlsProvider] {
        &self.clear_urls
    }

    pub fn embeds(&self) -> &[EmbedRule] {
        &self.embeds
    }

    pub fn fast_forward_rules(&self) -> &[FastForwardRule] {
        &self.fast_forward
    }

    pub fn lib_redirect_services(&self) -> &[CompiledLibRedirectService] {
        &self.lib_redirect
    }

    /// True if `host` or one of its parent domains is a known redirect tracker.
    pub fn is_known_tracker(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        let mut candidate = host.as_str();
        loop {
            if self.trackers.contains(candidate) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => return false,
            }
        }
    }

    /// First service whose patterns match `url`
    pub fn find_lib_redirect_service(&self, url: &str) -> Option<&CompiledLibRedirectService> {
        self.lib_redirect.iter().find(|service| service.matches(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_rules_load() {
        let store = RuleStore::embedded().unwrap();
        assert!(!store.clear_urls_providers().is_empty());
        assert!(!store.embeds().is_empty());
        assert!(!store.fast_forward_rules().is_empty());
        assert!(!store.lib_redirect_services().is_empty());
        assert_eq!(
            store.clear_urls_providers().last().map(|p| p.name.as_str()),
            Some("globalRules")
        );
    }

    #[test]
    fn test_known_tracker_matches_subdomains() {
        let store = RuleStore::embedded().unwrap();
        assert!(store.is_known_tracker("t.co"));
        assert!(store.is_known_tracker("BIT.LY"));
        assert!(store.is_known_tracker("www.bit.ly"));
        assert!(!store.is_known_tracker("co"));
        assert!(!store.is_known_tracker("example.com"));
    }

    #[test]
    fn test_find_lib_redirect_service() {
        let store = RuleStore::embedded().unwrap();
        let service = store.find_lib_redirect_service("https://www.youtube.com/watch?v=abc").unwrap();
        assert_eq!(service.service.key, "youtube");
        assert!(store.find_lib_redirect_service("https://example.com/").is_none());
    }

    #[test]
    fn test_bad_pattern_fails_construction() {
        let result = RuleStore::from_json(
            r#"{ "providers": { "bad": { "urlPattern": "(" } } }"#,
            r#"{ "embeds": [] }"#,
            r#"{ "rules": [] }"#,
            r#"{ "services": [] }"#,
        );
        assert!(matches!(result, Err(AppError::Other(_))));
    }
}
