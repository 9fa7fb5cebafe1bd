use serde::{Deserialize, Serialize};

/// How browsers are offered among the candidate apps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserMode {
    /// Hide all browsers, offer only dedicated apps
    None,

    /// Offer every installed browser
    #[default]
    AlwaysAsk,

    /// Offer only the selected browser
    SelectedBrowser,

    /// Offer only whitelisted browsers
    Whitelisted,
}

impl std::fmt::Display for BrowserMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserMode::None => write!(f, "none"),
            BrowserMode::AlwaysAsk => write!(f, "always_ask"),
            BrowserMode::SelectedBrowser => write!(f, "selected_browser"),
            BrowserMode::Whitelisted => write!(f, "whitelisted"),
        }
    }
}

/// Whether custom tabs (in-app browsers) may be kept for a referrer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InAppBrowserSettings {
    #[default]
    AllowAll,
    DisableInSelectedApps,
    DisableAll,
}
