// src/domain/intent/parser.rs
//
// Extracts the URI (or search query) an intent is about.

use std::sync::OnceLock;

use regex::Regex;

use super::entity::{Intent, IntentAction, EXTRA_QUERY, EXTRA_TEXT};
use crate::domain::Uri;

fn web_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("static web url pattern")
    })
}

/// Characters commonly glued to the end of a URL in prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\''];

/// Uri for a VIEW intent: the data field, nothing else.
pub fn parse_view_action(intent: &Intent) -> Option<Uri> {
    let data = intent.data.as_deref()?;
    Uri::parse(data).ok()
}

/// Uri for a SEND intent: the first web URL found in the shared text.
pub fn parse_send_action(intent: &Intent) -> Option<Uri> {
    let text = intent.get_string_extra(EXTRA_TEXT)?;
    find_url_in_text(text)
}

/// Non-empty, trimmed search query of a WEB_SEARCH intent.
pub fn parse_search_intent(intent: &Intent) -> Option<String> {
    let query = intent.get_string_extra(EXTRA_QUERY)?.trim();
    if query.is_empty() {
        return None;
    }
    Some(query.to_string())
}

/// Dispatch on the intent action. Only VIEW and SEND carry a link.
pub fn get_uri_from_intent(intent: &Intent) -> Option<Uri> {
    match intent.action {
        IntentAction::Send => parse_send_action(intent),
        IntentAction::View => parse_view_action(intent),
        _ => None,
    }
}

pub fn find_url_in_text(text: &str) -> Option<Uri> {
    web_url_pattern().find_iter(text).find_map(|candidate| {
        let trimmed = candidate.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if trimmed.len() >= 4 && trimmed[..4].eq_ignore_ascii_case("www.") {
            Uri::parse(&format!("https://{}", trimmed)).ok()
        } else {
            Uri::parse(trimmed).ok()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::ExtraValue;

    #[test]
    fn test_view_without_data_fails() {
        assert!(get_uri_from_intent(&Intent::new(IntentAction::View)).is_none());
    }

    #[test]
    fn test_view_with_data() {
        let uri = get_uri_from_intent(&Intent::view("https://example.com/x")).unwrap();
        assert_eq!(uri.as_str(), "https://example.com/x");
    }

    #[test]
    fn test_send_extracts_first_url_from_prose() {
        let intent = Intent::send_text("Check this out: https://example.com/post/1, really good.");
        let uri = get_uri_from_intent(&intent).unwrap();
        assert_eq!(uri.as_str(), "https://example.com/post/1");
    }

    #[test]
    fn test_send_with_bare_www_link() {
        let intent = Intent::send_text("see www.example.org/page");
        let uri = get_uri_from_intent(&intent).unwrap();
        assert_eq!(uri.as_str(), "https://www.example.org/page");
    }

    #[test]
    fn test_send_without_link_fails() {
        assert!(get_uri_from_intent(&Intent::send_text("no links here")).is_none());
    }

    #[test]
    fn test_other_actions_carry_no_uri() {
        let intent = Intent::new(IntentAction::Other("android.intent.action.EDIT".to_string()))
            .with_data("https://example.com");
        assert!(get_uri_from_intent(&intent).is_none());
    }

    #[test]
    fn test_search_query_trimmed_and_non_empty() {
        assert_eq!(
            parse_search_intent(&Intent::web_search("  rust lang ")).as_deref(),
            Some("rust lang")
        );
        assert!(parse_search_intent(&Intent::web_search("   ")).is_none());
        let wrong_type = Intent::new(IntentAction::WebSearch)
            .with_extra(EXTRA_QUERY, ExtraValue::Int(3));
        assert!(parse_search_intent(&wrong_type).is_none());
    }
}
