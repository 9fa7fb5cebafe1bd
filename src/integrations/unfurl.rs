// src/integrations/unfurl.rs
//
// Page preview metadata (Open Graph with HTML fallbacks)

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::domain::PreviewMetadata;
use crate::error::AppResult;
use crate::integrations::html;
use crate::integrations::http::{is_html_content_type, read_html_prefix};

/// Redirect hops followed while fetching a page to unfurl
const MAX_HOPS: usize = 5;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Unfurler: Send + Sync {
    /// `Ok(None)` when the URL is not an HTML page or carries no metadata
    async fn unfurl(&self, url: &str) -> AppResult<Option<PreviewMetadata>>;
}

/// Extract preview metadata from an HTML document served at `url`.
pub fn parse_preview(url: &str, body: &str) -> Option<PreviewMetadata> {
    let page = html::HtmlPage::parse(body);
    let absolute = |reference: String| html::absolutize(url, &reference);

    let preview = PreviewMetadata {
        url: page
            .meta_content("og:url")
            .and_then(absolute)
            .unwrap_or_else(|| url.to_string()),
        title: page
            .meta_content("og:title")
            .or_else(|| page.meta_content("twitter:title"))
            .or_else(|| page.title()),
        description: page
            .meta_content("og:description")
            .or_else(|| page.meta_content("description")),
        image_url: page
            .meta_content("og:image")
            .or_else(|| page.meta_content("twitter:image"))
            .and_then(absolute),
        favicon: page
            .link_href("icon")
            .or_else(|| page.link_href("apple-touch-icon"))
            .and_then(absolute),
        site_name: page.meta_content("og:site_name"),
    };

    (!preview.is_empty()).then_some(preview)
}

pub struct HttpUnfurler {
    client: Client,
}

impl HttpUnfurler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Unfurler for HttpUnfurler {
    async fn unfurl(&self, url: &str) -> AppResult<Option<PreviewMetadata>> {
        let mut current = url.to_string();

        for _ in 0..=MAX_HOPS {
            let response = self
                .client
                .get(&current)
                .header(header::ACCEPT, "text/html,application/xhtml+xml")
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
                    return Ok(None);
                };
                current = next;
                continue;
            }

            if !status.is_success() {
                log::debug!("Unfurl of {} returned {}", current, status);
                return Ok(None);
            }

            let is_html = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(is_html_content_type);
            if !is_html {
                return Ok(None);
            }

            let body = read_html_prefix(response).await?;
            return Ok(parse_preview(&current, &body));
        }

        log::debug!("Unfurl of {} exceeded {} redirects", url, MAX_HOPS);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preview_prefers_open_graph() {
        let body = r#"
            <head>
              <title>Fallback</title>
              <meta property="og:title" content="Article">
              <meta property="og:site_name" content="Example News">
              <meta property="og:image" content="/cover.jpg">
              <meta name="description" content="Plain description">
              <link rel="icon" href="/favicon.png">
            </head>
        "#;
        let preview = parse_preview("https://example.com/news/1", body).unwrap();
        assert_eq!(preview.url, "https://example.com/news/1");
        assert_eq!(preview.title.as_deref(), Some("Article"));
        assert_eq!(preview.description.as_deref(), Some("Plain description"));
        assert_eq!(preview.image_url.as_deref(), Some("https://example.com/cover.jpg"));
        assert_eq!(preview.favicon.as_deref(), Some("https://example.com/favicon.png"));
        assert_eq!(preview.site_name.as_deref(), Some("Example News"));
    }

    #[test]
    fn test_parse_preview_empty_page() {
        assert!(parse_preview("https://example.com/", "<html><body>hi</body></html>").is_none());
    }
}
