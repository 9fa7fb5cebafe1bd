// src/services/url_modifier.rs
//
// URL Modifier Chain
//
// Fixed order: embed resolution → FastForward → ClearURLs.
//
// CRITICAL RULES:
// - Each modifier is toggle-gated by settings
// - A failing modifier is logged and acts as identity
// - Every modifier runs to a fixed point, so applying it to its own
//   output changes nothing
// - Only the final string must parse as a Uri; otherwise the chain fails

use std::sync::Arc;

use url::{form_urlencoded, Url};

use crate::config::ResolverSettings;
use crate::domain::Uri;
use crate::error::{AppError, AppResult};
use crate::infrastructure::RuleStore;

/// Rounds a modifier may rewrite its own output
const MAX_ROUNDS: usize = 5;

pub struct UrlModifierChain {
    rules: Arc<RuleStore>,
}

impl UrlModifierChain {
    pub fn new(rules: Arc<RuleStore>) -> Self {
        Self { rules }
    }

    /// Run every enabled modifier over `uri`.
    pub fn apply(&self, uri: &Uri, settings: &ResolverSettings) -> AppResult<Uri> {
        if !settings.any_uri_modifier() {
            return Ok(uri.clone());
        }

        let mut url = uri.as_str().to_string();

        if settings.resolve_embeds {
            url = absorb("embed", &url, self.resolve_embed(&url));
        }
        if settings.use_fast_forward_rules {
            url = absorb("fastforward", &url, self.fast_forward(&url));
        }
        if settings.use_clear_urls {
            url = absorb("clearurls", &url, self.clear_url(&url));
        }

        Uri::parse(&url).map_err(|e| {
            log::warn!("Link modifiers produced an unusable URL '{}': {}", url, e);
            AppError::InvalidUri(url)
        })
    }

    /// Swap embed-proxy hosts (vxtwitter.com, ddinstagram.com, ...) for the real site.
    pub fn resolve_embed(&self, url: &str) -> AppResult<String> {
        let mut parsed = Url::parse(url)?;
        let Some(host) = parsed.host_str().map(str::to_lowercase) else {
            return Ok(url.to_string());
        };

        let rule = self.rules.embeds().iter().find(|rule| {
            rule.hosts
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
        });

        match rule {
            Some(rule) => {
                parsed.set_host(Some(&rule.target))?;
                Ok(parsed.into())
            }
            None => Ok(url.to_string()),
        }
    }

    /// Unwrap tracking redirects that carry the destination in a query parameter.
    pub fn fast_forward(&self, url: &str) -> AppResult<String> {
        let mut current = url.to_string();

        for _ in 0..MAX_ROUNDS {
            let Some(next) = self.fast_forward_once(&current)? else {
                return Ok(current);
            };
            current = next;
        }

        Ok(current)
    }

    fn fast_forward_once(&self, url: &str) -> AppResult<Option<String>> {
        let Some(rule) = self
            .rules
            .fast_forward_rules()
            .iter()
            .find(|rule| rule.pattern.is_match(url))
        else {
            return Ok(None);
        };

        let parsed = Url::parse(url)?;
        let target = parsed
            .query_pairs()
            .find(|(key, _)| key == rule.param.as_str())
            .map(|(_, value)| value.into_owned());

        match target {
            Some(target) if Uri::parse(&target).is_ok_and(|t| t.is_http()) => {
                log::debug!("FastForward rule '{}' unwrapped {}", rule.name, url);
                Ok(Some(target))
            }
            _ => Ok(None),
        }
    }

    /// Apply ClearURLs providers: redirections, raw rules, then field rules.
    pub fn clear_url(&self, url: &str) -> AppResult<String> {
        let mut current = url.to_string();

        for _ in 0..MAX_ROUNDS {
            let next = self.clear_url_once(&current)?;
            if next == current {
                return Ok(current);
            }
            current = next;
        }

        Ok(current)
    }

    fn clear_url_once(&self, url: &str) -> AppResult<String> {
        let mut current = url.to_string();

        for provider in self.rules.clear_urls_providers() {
            if provider.complete_provider || !provider.applies_to(&current) {
                continue;
            }

            for redirection in &provider.redirections {
                let target = redirection
                    .captures(&current)
                    .and_then(|caps| caps.get(1))
                    .map(|m| percent_decode(m.as_str()));

                if let Some(target) = target.filter(|t| Uri::parse(t).is_ok()) {
                    log::debug!("ClearURLs provider '{}' redirected {}", provider.name, current);
                    return Ok(target);
                }
            }

            for raw in &provider.raw_rules {
                current = raw.replace_all(&current, "").into_owned();
            }

            if !provider.rules.is_empty() {
                current = remove_query_fields(&current, |key| {
                    provider.rules.iter().any(|rule| rule.is_match(key))
                })?;
            }
        }

        Ok(current)
    }
}

fn absorb(name: &str, input: &str, result: AppResult<String>) -> String {
    match result {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Link modifier '{}' failed on {}: {}", name, input, e);
            input.to_string()
        }
    }
}

fn percent_decode(encoded: &str) -> String {
    form_urlencoded::parse(format!("v={}", encoded).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| encoded.to_string())
}

/// Drop query fields whose decoded name matches `remove`. Kept fields
/// stay byte-for-byte as they were.
fn remove_query_fields<F>(url: &str, remove: F) -> AppResult<String>
where
    F: Fn(&str) -> bool,
{
    let mut parsed = Url::parse(url)?;
    let Some(query) = parsed.query() else {
        return Ok(url.to_string());
    };

    let segments: Vec<&str> = query.split('&').filter(|s| !s.is_empty()).collect();
    let kept: Vec<&str> = segments
        .iter()
        .copied()
        .filter(|segment| {
            let key = form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(key, _)| key.into_owned())
                .unwrap_or_default();
            !remove(&key)
        })
        .collect();

    if kept.len() == segments.len() {
        return Ok(url.to_string());
    }

    let new_query = kept.join("&");
    parsed.set_query((!new_query.is_empty()).then_some(new_query.as_str()));
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> UrlModifierChain {
        UrlModifierChain::new(Arc::new(RuleStore::embedded().unwrap()))
    }

    fn all_enabled() -> ResolverSettings {
        ResolverSettings {
            resolve_embeds: true,
            use_fast_forward_rules: true,
            use_clear_urls: true,
            ..ResolverSettings::default()
        }
    }

    #[test]
    fn test_disabled_chain_is_identity() {
        let uri = Uri::parse("https://vxtwitter.com/a/status/1?utm_source=x").unwrap();
        assert_eq!(chain().apply(&uri, &ResolverSettings::default()).unwrap(), uri);
    }

    #[test]
    fn test_clear_url_removes_tracking_fields_only() {
        let cleaned = chain()
            .clear_url("https://example.com/a?id=5&utm_source=news&utm_medium=mail&q=a%20b#top")
            .unwrap();
        assert_eq!(cleaned, "https://example.com/a?id=5&q=a%20b#top");

        let cleaned = chain().clear_url("https://example.com/a?fbclid=abc").unwrap();
        assert_eq!(cleaned, "https://example.com/a");
    }

    #[test]
    fn test_clear_url_follows_provider_redirection() {
        let cleaned = chain()
            .clear_url("https://www.google.com/url?sa=t&url=https%3A%2F%2Fexample.com%2Fpage%3Fid%3D1&usg=xyz")
            .unwrap();
        assert_eq!(cleaned, "https://example.com/page?id=1");
    }

    #[test]
    fn test_clear_url_raw_rules() {
        let cleaned = chain()
            .clear_url("https://www.amazon.com/dp/B000/ref=sr_1_1?keywords=x&qid=1")
            .unwrap();
        assert_eq!(cleaned, "https://www.amazon.com/dp/B000?keywords=x");
    }

    #[test]
    fn test_fast_forward_unwraps_nested_redirects() {
        let inner = "https://steamcommunity.com/linkfilter/?u=https%3A%2F%2Fexample.com%2Fx";
        let outer = format!("https://out.reddit.com/t3?url={}", percent_encode(inner));
        assert_eq!(chain().fast_forward(&outer).unwrap(), "https://example.com/x");
    }

    #[test]
    fn test_embed_host_is_replaced() {
        assert_eq!(
            chain().resolve_embed("https://www.vxtwitter.com/user/status/1").unwrap(),
            "https://x.com/user/status/1"
        );
        assert_eq!(
            chain().resolve_embed("https://example.com/").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_each_modifier_is_idempotent() {
        let c = chain();
        let inputs = [
            "https://vxtwitter.com/a/status/1?utm_source=x",
            "https://out.reddit.com/t3?url=https%3A%2F%2Fexample.com%2F%3Fgclid%3D1",
            "https://www.google.com/url?q=https%3A%2F%2Fexample.com%2F%3Futm_campaign%3Dz",
            "https://example.com/?a=1&b=2",
        ];
        for input in inputs {
            let once = c.resolve_embed(input).unwrap();
            assert_eq!(c.resolve_embed(&once).unwrap(), once);

            let once = c.fast_forward(input).unwrap();
            assert_eq!(c.fast_forward(&once).unwrap(), once);

            let once = c.clear_url(input).unwrap();
            assert_eq!(c.clear_url(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_full_chain_order() {
        let uri = Uri::parse(
            "https://out.reddit.com/t3?url=https%3A%2F%2Ffxtwitter.com%2Fu%2Fstatus%2F1%3Futm_source%3Dreddit",
        )
        .unwrap();
        // embed runs before fastforward, so the unwrapped embed host survives
        let result = chain().apply(&uri, &all_enabled()).unwrap();
        assert_eq!(result.as_str(), "https://fxtwitter.com/u/status/1");
    }

    fn percent_encode(s: &str) -> String {
        form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}
