use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Uri;

/// Extra key carrying shared text (share action payload).
pub const EXTRA_TEXT: &str = "android.intent.extra.TEXT";

/// Extra key carrying a web-search query.
pub const EXTRA_QUERY: &str = "query";

/// Transient, per-request flag asking the resolver to leave the URL on its
/// original site. Consumed by the LibRedirect stage.
pub const EXTRA_LIB_REDIRECT_IGNORE: &str = "linksheet.extra.LIBREDIRECT_IGNORE";

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    View,
    Send,
    WebSearch,
    Other(String),
}

impl std::fmt::Display for IntentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentAction::View => write!(f, "android.intent.action.VIEW"),
            IntentAction::Send => write!(f, "android.intent.action.SEND"),
            IntentAction::WebSearch => write!(f, "android.intent.action.WEB_SEARCH"),
            IntentAction::Other(action) => write!(f, "{}", action),
        }
    }
}

/// Typed extra value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// The incoming request: action, optional data URI and extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,

    /// Raw data string (not yet validated)
    pub data: Option<String>,

    pub mime_type: Option<String>,

    pub extras: BTreeMap<String, ExtraValue>,

    /// Explicit target component ("package/activity"), if any
    pub component: Option<String>,
}

impl Intent {
    pub fn new(action: IntentAction) -> Self {
        Self {
            action,
            data: None,
            mime_type: None,
            extras: BTreeMap::new(),
            component: None,
        }
    }

    /// VIEW intent carrying `data`
    pub fn view(data: impl Into<String>) -> Self {
        Self::new(IntentAction::View).with_data(data)
    }

    /// SEND intent carrying plain text
    pub fn send_text(text: impl Into<String>) -> Self {
        let mut intent = Self::new(IntentAction::Send);
        intent.mime_type = Some("text/plain".to_string());
        intent.put_extra(EXTRA_TEXT, ExtraValue::Str(text.into()));
        intent
    }

    /// WEB_SEARCH intent carrying a query
    pub fn web_search(query: impl Into<String>) -> Self {
        let mut intent = Self::new(IntentAction::WebSearch);
        intent.put_extra(EXTRA_QUERY, ExtraValue::Str(query.into()));
        intent
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: ExtraValue) -> Self {
        self.put_extra(key, value);
        self
    }

    pub fn put_extra(&mut self, key: &str, value: ExtraValue) {
        self.extras.insert(key.to_string(), value);
    }

    pub fn has_extra(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    pub fn remove_extra(&mut self, key: &str) -> Option<ExtraValue> {
        self.extras.remove(key)
    }

    pub fn get_bool_extra(&self, key: &str, default: bool) -> bool {
        match self.extras.get(key) {
            Some(ExtraValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn get_string_extra(&self, key: &str) -> Option<&str> {
        match self.extras.get(key) {
            Some(ExtraValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Build a fresh intent with `action` targeting `uri`, carrying over all
    /// extras except `drop_extras` and the transient LibRedirect flag. The
    /// explicit component is never carried over.
    pub fn sanitized(&self, action: IntentAction, uri: &Uri, drop_extras: &[String]) -> Intent {
        let extras = self
            .extras
            .iter()
            .filter(|(key, _)| key.as_str() != EXTRA_LIB_REDIRECT_IGNORE)
            .filter(|(key, _)| !drop_extras.iter().any(|dropped| dropped == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Intent {
            action,
            data: Some(uri.to_string()),
            mime_type: None,
            extras,
            component: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_extra_defaults_on_type_mismatch() {
        let intent = Intent::view("https://example.com")
            .with_extra("flag", ExtraValue::Str("true".to_string()));
        assert!(!intent.get_bool_extra("flag", false));
        assert!(intent.get_bool_extra("missing", true));
    }

    #[test]
    fn test_sanitized_drops_requested_extras_and_component() {
        let mut intent = Intent::view("https://example.com/a")
            .with_extra("keep", ExtraValue::Int(1))
            .with_extra("drop", ExtraValue::Bool(true))
            .with_extra(EXTRA_LIB_REDIRECT_IGNORE, ExtraValue::Bool(true));
        intent.component = Some("com.example/.Main".to_string());

        let uri = Uri::parse("https://example.org/b").unwrap();
        let sanitized = intent.sanitized(IntentAction::View, &uri, &["drop".to_string()]);

        assert_eq!(sanitized.data.as_deref(), Some("https://example.org/b"));
        assert!(sanitized.has_extra("keep"));
        assert!(!sanitized.has_extra("drop"));
        assert!(!sanitized.has_extra(EXTRA_LIB_REDIRECT_IGNORE));
        assert!(sanitized.component.is_none());
    }
}
