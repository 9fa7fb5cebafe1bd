// src/integrations/url_backend.rs
//
// Network side of redirect and AMP resolution.
//
// Backends only talk to the network. Cache, offline and darknet policy,
// timeouts and fail-open behaviour live in the resolver service.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{ResolveModule, Uri};
use crate::error::{AppError, AppResult};
use crate::integrations::html;
use crate::integrations::http::{is_html_content_type, read_html_prefix};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlResolveBackend: Send + Sync {
    /// Resolved URL string; may equal the input
    async fn resolve(&self, uri: &Uri) -> AppResult<String>;
}

const MAX_REDIRECTS: usize = 10;

// ============================================================================
// REDIRECT FOLLOWER
// ============================================================================

/// Walks the `Location` chain by hand and returns the last URL reached.
pub struct HttpRedirectBackend {
    client: Client,
}

impl HttpRedirectBackend {
    /// `client` must not follow redirects itself
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlResolveBackend for HttpRedirectBackend {
    async fn resolve(&self, uri: &Uri) -> AppResult<String> {
        let mut current = uri.as_str().to_string();

        for _ in 0..MAX_REDIRECTS {
            let mut response = self.client.head(&current).send().await?;

            // Some shorteners reject HEAD
            if response.status() == StatusCode::METHOD_NOT_ALLOWED {
                response = self.client.get(&current).send().await?;
            }

            let status = response.status();
            if !status.is_redirection() {
                return Ok(current);
            }

            let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok(current);
            };

            current = html::absolutize(&current, location)
                .ok_or_else(|| AppError::InvalidUri(format!("Invalid redirect target: {}", location)))?;
        }

        Err(AppError::Other(format!("Too many redirects from {}", uri)))
    }
}

// ============================================================================
// AMP → CANONICAL
// ============================================================================

/// Decode a Google AMP cache URL without touching the network:
/// `https://<dashed-host>.cdn.ampproject.org/c/s/<host>/<path>`
pub fn decode_amp_cache_url(uri: &Uri) -> Option<String> {
    if !uri.host().ends_with(".cdn.ampproject.org") {
        return None;
    }

    let path = uri.path();
    let (scheme, rest) = if let Some(rest) = path.strip_prefix("/c/s/").or_else(|| path.strip_prefix("/v/s/")) {
        ("https", rest)
    } else if let Some(rest) = path.strip_prefix("/c/").or_else(|| path.strip_prefix("/v/")) {
        ("http", rest)
    } else {
        return None;
    };

    if rest.is_empty() {
        return None;
    }

    let mut decoded = format!("{}://{}", scheme, rest);
    if let Some(query) = uri.url().query() {
        decoded.push('?');
        decoded.push_str(query);
    }
    Some(decoded)
}

/// Fetches the AMP page and follows its `<link rel="canonical">`.
pub struct HttpAmp2HtmlBackend {
    client: Client,
}

impl HttpAmp2HtmlBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlResolveBackend for HttpAmp2HtmlBackend {
    async fn resolve(&self, uri: &Uri) -> AppResult<String> {
        if let Some(decoded) = decode_amp_cache_url(uri) {
            return Ok(decoded);
        }

        let mut current = uri.as_str().to_string();
        for _ in 0..MAX_REDIRECTS {
            let response = self
                .client
                .get(&current)
                .header(header::ACCEPT, "text/html")
                .send()
                .await?;

            let status = response.status();
            if status.is_redirection() {
                let Some(next) = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|location| html::absolutize(&current, location))
                else {
                    return Ok(current);
                };
                current = next;
                continue;
            }

            let is_html = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(is_html_content_type);
            if !status.is_success() || !is_html {
                return Ok(current);
            }

            let body = read_html_prefix(response).await?;
            return Ok(html::canonical_url(&current, &body).unwrap_or(current));
        }

        Err(AppError::Other(format!("Too many redirects from {}", uri)))
    }
}

// ============================================================================
// EXTERNAL SERVICE
// ============================================================================

#[derive(Debug, Serialize)]
struct ExternalRequest<'a> {
    url: &'a str,
    module: ResolveModule,
}

#[derive(Debug, Deserialize)]
struct ExternalResponse {
    resolved_url: String,
}

/// Delegates resolution to a remote HTTP service:
/// POST `{ "url", "module" }` → `{ "resolved_url" }`.
pub struct ExternalServiceBackend {
    client: Client,
    endpoint: String,
    module: ResolveModule,
}

impl ExternalServiceBackend {
    pub fn new(client: Client, endpoint: &str, module: ResolveModule) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            module,
        }
    }
}

#[async_trait]
impl UrlResolveBackend for ExternalServiceBackend {
    async fn resolve(&self, uri: &Uri) -> AppResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(&ExternalRequest {
                url: uri.as_str(),
                module: self.module,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Other(format!(
                "Resolve service returned status: {}",
                response.status()
            )));
        }

        let body: ExternalResponse = response.json().await?;
        Ok(body.resolved_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_amp_cache_url() {
        let uri = Uri::parse("https://www-example-com.cdn.ampproject.org/c/s/www.example.com/amp/story?id=1").unwrap();
        assert_eq!(
            decode_amp_cache_url(&uri).as_deref(),
            Some("https://www.example.com/amp/story?id=1")
        );

        let plain = Uri::parse("https://example-com.cdn.ampproject.org/c/example.com/a").unwrap();
        assert_eq!(decode_amp_cache_url(&plain).as_deref(), Some("http://example.com/a"));
    }

    #[test]
    fn test_decode_ignores_other_hosts() {
        let uri = Uri::parse("https://amp.example.com/page").unwrap();
        assert!(decode_amp_cache_url(&uri).is_none());
    }
}
