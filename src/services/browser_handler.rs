// src/services/browser_handler.rs
//
// Browser filter
//
// Splits the enumerated handlers into dedicated apps and browsers, then
// applies the browser mode to the browsers only.
//
// CRITICAL RULES:
// - Dedicated apps are never filtered out
// - Enumeration order is preserved
// - The two single-option conditions stay separate on the result

use std::collections::{BTreeSet, HashSet};

use crate::domain::{ActivityInfo, BrowserMode, DisplayActivityInfo};

/// Handlers left after applying a browser mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredBrowserList {
    pub browser_mode: BrowserMode,

    /// Apps and kept browsers, in enumeration order
    pub candidates: Vec<DisplayActivityInfo>,

    /// Number of non-browser handlers
    pub apps: usize,

    /// Number of browsers kept by the mode
    pub browsers: usize,

    /// The selected browser is installed and no dedicated app competes with it
    pub is_single_option: bool,

    /// Mode left no browser and exactly one dedicated app handles the link
    pub no_browsers_only_single_app: bool,
}

impl FilteredBrowserList {
    pub fn has_single_matching_option(&self) -> bool {
        self.is_single_option || self.no_browsers_only_single_app
    }
}

/// Apply `mode` to `handlers`. `browsers` is the set of installed browsers
/// used to classify each handler.
pub fn filter_browsers(
    mode: BrowserMode,
    selected: Option<&str>,
    whitelist: &BTreeSet<String>,
    handlers: Vec<ActivityInfo>,
    browsers: &[ActivityInfo],
) -> FilteredBrowserList {
    let browser_packages: HashSet<&str> = browsers.iter().map(|b| b.package_name.as_str()).collect();

    let mut candidates = Vec::with_capacity(handlers.len());
    let mut apps = 0;
    let mut kept_browsers = 0;
    let mut selected_found = false;

    for handler in handlers {
        let is_browser = browser_packages.contains(handler.package_name.as_str());
        if !is_browser {
            apps += 1;
            candidates.push(handler.to_display(false, None));
            continue;
        }

        let keep = match mode {
            BrowserMode::None => false,
            BrowserMode::AlwaysAsk => true,
            BrowserMode::SelectedBrowser => selected == Some(handler.package_name.as_str()),
            BrowserMode::Whitelisted => whitelist.contains(&handler.package_name),
        };

        if keep {
            if mode == BrowserMode::SelectedBrowser {
                selected_found = true;
            }
            kept_browsers += 1;
            candidates.push(handler.to_display(true, None));
        }
    }

    let is_single_option = mode == BrowserMode::SelectedBrowser && selected_found && apps == 0;
    let no_browsers_only_single_app = kept_browsers == 0 && apps == 1;

    log::debug!(
        "Browser mode {}: {} apps, {} browsers kept",
        mode,
        apps,
        kept_browsers
    );

    FilteredBrowserList {
        browser_mode: mode,
        candidates,
        apps,
        browsers: kept_browsers,
        is_single_option,
        no_browsers_only_single_app,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(package: &str) -> ActivityInfo {
        ActivityInfo::new(package, &format!("{}.Main", package), package)
    }

    fn installed_browsers() -> Vec<ActivityInfo> {
        vec![activity("org.mozilla.firefox"), activity("com.android.chrome")]
    }

    fn handlers(with_app: bool) -> Vec<ActivityInfo> {
        let mut handlers = vec![activity("org.mozilla.firefox")];
        if with_app {
            handlers.push(activity("com.reddit.frontpage"));
        }
        handlers.push(activity("com.android.chrome"));
        handlers
    }

    fn packages(list: &FilteredBrowserList) -> Vec<&str> {
        list.candidates.iter().map(|c| c.package_name.as_str()).collect()
    }

    #[test]
    fn test_always_ask_keeps_everything_in_order() {
        let list = filter_browsers(BrowserMode::AlwaysAsk, None, &BTreeSet::new(), handlers(true), &installed_browsers());
        assert_eq!(
            packages(&list),
            vec!["org.mozilla.firefox", "com.reddit.frontpage", "com.android.chrome"]
        );
        assert_eq!((list.apps, list.browsers), (1, 2));
        assert!(list.candidates[0].browser);
        assert!(!list.candidates[1].browser);
        assert!(!list.has_single_matching_option());
    }

    #[test]
    fn test_none_hides_browsers() {
        let list = filter_browsers(BrowserMode::None, None, &BTreeSet::new(), handlers(true), &installed_browsers());
        assert_eq!(packages(&list), vec!["com.reddit.frontpage"]);
        assert!(list.no_browsers_only_single_app);
        assert!(!list.is_single_option);
    }

    #[test]
    fn test_selected_browser_alone_is_single_option() {
        let list = filter_browsers(
            BrowserMode::SelectedBrowser,
            Some("com.android.chrome"),
            &BTreeSet::new(),
            handlers(false),
            &installed_browsers(),
        );
        assert_eq!(packages(&list), vec!["com.android.chrome"]);
        assert!(list.is_single_option);
        assert!(!list.no_browsers_only_single_app);
    }

    #[test]
    fn test_selected_browser_with_app_is_not_single_option() {
        let list = filter_browsers(
            BrowserMode::SelectedBrowser,
            Some("com.android.chrome"),
            &BTreeSet::new(),
            handlers(true),
            &installed_browsers(),
        );
        assert_eq!(packages(&list), vec!["com.reddit.frontpage", "com.android.chrome"]);
        assert!(!list.is_single_option);
        assert!(!list.no_browsers_only_single_app);
    }

    #[test]
    fn test_missing_selected_browser() {
        let list = filter_browsers(
            BrowserMode::SelectedBrowser,
            Some("com.brave.browser"),
            &BTreeSet::new(),
            handlers(true),
            &installed_browsers(),
        );
        assert_eq!(packages(&list), vec!["com.reddit.frontpage"]);
        assert!(!list.is_single_option);
        assert!(list.no_browsers_only_single_app);
    }

    #[test]
    fn test_whitelisted_keeps_intersection() {
        let whitelist: BTreeSet<String> = ["org.mozilla.firefox".to_string()].into();
        let list = filter_browsers(BrowserMode::Whitelisted, None, &whitelist, handlers(false), &installed_browsers());
        assert_eq!(packages(&list), vec!["org.mozilla.firefox"]);
        assert!(!list.has_single_matching_option());
    }
}
