// src/integrations/html.rs
//
// HTML head scraping: <title>, <meta>, <link>.
//
// `HtmlPage` is not Send; parse, extract and drop it without crossing
// an await point.

use scraper::{Html, Selector};
use url::Url;

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// A parsed HTML document.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    /// Content of the first `<meta property=key>` or `<meta name=key>`
    pub fn meta_content(&self, key: &str) -> Option<String> {
        let sel = selector("meta[content]")?;
        self.document.select(&sel).find_map(|element| {
            let element = element.value();
            let matches = element
                .attr("property")
                .or_else(|| element.attr("name"))
                .is_some_and(|k| k.trim().eq_ignore_ascii_case(key));
            if matches {
                element.attr("content").and_then(non_empty)
            } else {
                None
            }
        })
    }

    pub fn title(&self) -> Option<String> {
        let sel = selector("title")?;
        let element = self.document.select(&sel).next()?;
        non_empty(&element.text().collect::<String>())
    }

    /// `href` of the first `<link>` whose `rel` list contains `rel`
    pub fn link_href(&self, rel: &str) -> Option<String> {
        let sel = selector("link[rel][href]")?;
        self.document.select(&sel).find_map(|element| {
            let element = element.value();
            let has_rel = element
                .attr("rel")
                .is_some_and(|rels| rels.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)));
            if has_rel {
                element.attr("href").and_then(non_empty)
            } else {
                None
            }
        })
    }
}

/// `<link rel=canonical>` of a page, absolute against `page_url`.
pub fn canonical_url(page_url: &str, body: &str) -> Option<String> {
    let href = HtmlPage::parse(body).link_href("canonical")?;
    absolutize(page_url, &href)
}

/// Resolve a possibly relative reference against the page URL.
pub fn absolutize(base: &str, reference: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|base| base.join(reference))
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <title> Example &amp; Co </title>
          <meta property="og:title" content="OG Title">
          <meta content='Shared description' name='description'>
          <meta property="og:image" content="/img/cover.png"/>
          <link rel="shortcut icon" href="/favicon.ico">
          <link href="https://example.com/page" rel="canonical">
        </head><body></body></html>
    "#;

    #[test]
    fn test_meta_content_either_attribute_order() {
        let page = HtmlPage::parse(PAGE);
        assert_eq!(page.meta_content("og:title").as_deref(), Some("OG Title"));
        assert_eq!(page.meta_content("description").as_deref(), Some("Shared description"));
        assert!(page.meta_content("og:site_name").is_none());
    }

    #[test]
    fn test_title_decodes_entities() {
        assert_eq!(HtmlPage::parse(PAGE).title().as_deref(), Some("Example & Co"));
    }

    #[test]
    fn test_meta_content_decodes_named_and_numeric_entities() {
        let page = HtmlPage::parse(r#"<meta name="description" content="Caf&eacute; &#8211; News">"#);
        assert_eq!(page.meta_content("description").as_deref(), Some("Café – News"));
    }

    #[test]
    fn test_link_href_by_rel_token() {
        let page = HtmlPage::parse(PAGE);
        assert_eq!(page.link_href("canonical").as_deref(), Some("https://example.com/page"));
        assert_eq!(page.link_href("icon").as_deref(), Some("/favicon.ico"));
        assert!(page.link_href("amphtml").is_none());
    }

    #[test]
    fn test_link_href_unquoted_attributes() {
        let page = HtmlPage::parse("<link rel=canonical href=https://example.com/real>");
        assert_eq!(page.link_href("canonical").as_deref(), Some("https://example.com/real"));
    }

    #[test]
    fn test_commented_out_canonical_is_ignored() {
        let body = r#"<head>
            <!-- <link rel="canonical" href="https://stale.example/old"> -->
            <link rel="canonical" href="/article">
        </head>"#;
        assert_eq!(
            canonical_url("https://amp.example.com/amp/article", body).as_deref(),
            Some("https://amp.example.com/article")
        );
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://example.com/a/b", "/img/cover.png").as_deref(),
            Some("https://example.com/img/cover.png")
        );
    }
}
