use super::entity::Intent;

/// Extra that marks an intent as a custom-tab launch.
pub const EXTRA_CUSTOM_TAB_SESSION: &str = "android.support.customtabs.extra.SESSION";

const CUSTOM_TAB_EXTRA_PREFIXES: &[&str] = &[
    "android.support.customtabs.extra.",
    "androidx.browser.customtabs.extra.",
];

/// Custom-tab facts about an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTabInfo {
    /// The intent is a custom tab and custom tabs are allowed for it
    pub custom_tab: bool,

    /// Extras to strip from the outgoing intent
    pub drop_extras: Vec<String>,
}

pub fn is_custom_tab(intent: &Intent) -> bool {
    intent.has_extra(EXTRA_CUSTOM_TAB_SESSION)
}

/// Decide how a possibly custom-tab intent should be forwarded.
/// A disallowed custom tab is downgraded by dropping every custom-tab extra.
pub fn custom_tab_info(intent: &Intent, allow_custom_tab: bool) -> CustomTabInfo {
    let custom_tab = is_custom_tab(intent);
    if !custom_tab || allow_custom_tab {
        return CustomTabInfo {
            custom_tab,
            drop_extras: Vec::new(),
        };
    }

    let drop_extras = intent
        .extras
        .keys()
        .filter(|key| CUSTOM_TAB_EXTRA_PREFIXES.iter().any(|p| key.starts_with(p)))
        .cloned()
        .collect();

    CustomTabInfo {
        custom_tab: false,
        drop_extras,
    }
}
