// src/config/settings.rs
//
// Every preference and experiment flag the resolution pipeline reads.
// Unknown or missing keys fall back to their defaults.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{BrowserMode, InAppBrowserSettings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    // ------------------------------------------------------------------
    // Link modifiers
    // ------------------------------------------------------------------
    pub use_clear_urls: bool,
    pub use_fast_forward_rules: bool,
    pub resolve_embeds: bool,

    // ------------------------------------------------------------------
    // LibRedirect
    // ------------------------------------------------------------------
    pub enable_lib_redirect: bool,
    /// Allow the per-request "ignore LibRedirect" extra to take effect
    pub enable_ignore_lib_redirect_button: bool,

    // ------------------------------------------------------------------
    // Redirect resolution
    // ------------------------------------------------------------------
    pub follow_redirects: bool,
    pub follow_redirects_skip_browser: bool,
    pub follow_only_known_trackers: bool,
    pub follow_redirects_local_cache: bool,
    pub follow_redirects_external_service: bool,
    pub follow_redirects_allow_darknets: bool,

    // ------------------------------------------------------------------
    // AMP resolution
    // ------------------------------------------------------------------
    pub enable_amp2html: bool,
    pub amp2html_skip_browser: bool,
    pub amp2html_local_cache: bool,
    pub amp2html_external_service: bool,
    pub amp2html_allow_darknets: bool,

    /// Network timeout shared by redirect, AMP and downloader probes
    pub request_timeout_secs: u64,

    // ------------------------------------------------------------------
    // Downloader
    // ------------------------------------------------------------------
    pub enable_downloader: bool,
    /// Try the file-extension heuristic before probing the network
    pub downloader_check_url_mime_type: bool,

    // ------------------------------------------------------------------
    // App selection
    // ------------------------------------------------------------------
    pub dont_show_filtered_item: bool,
    pub browser_mode: BrowserMode,
    pub selected_browser: Option<String>,
    pub in_app_browser_mode: BrowserMode,
    pub selected_in_app_browser: Option<String>,
    pub unified_preferred_browser: bool,
    pub in_app_browser_settings: InAppBrowserSettings,
    /// Referring packages for which custom tabs are disabled
    pub in_app_browser_disabled_packages: BTreeSet<String>,

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------
    pub url_preview: bool,
    pub url_preview_skip_browser: bool,
    pub preview_timeout_secs: u64,
    pub lib_redirect_js_engine: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            use_clear_urls: false,
            use_fast_forward_rules: false,
            resolve_embeds: false,

            enable_lib_redirect: false,
            enable_ignore_lib_redirect_button: false,

            follow_redirects: false,
            follow_redirects_skip_browser: true,
            follow_only_known_trackers: true,
            follow_redirects_local_cache: true,
            follow_redirects_external_service: false,
            follow_redirects_allow_darknets: false,

            enable_amp2html: false,
            amp2html_skip_browser: true,
            amp2html_local_cache: true,
            amp2html_external_service: false,
            amp2html_allow_darknets: false,

            request_timeout_secs: 15,

            enable_downloader: false,
            downloader_check_url_mime_type: false,

            dont_show_filtered_item: false,
            browser_mode: BrowserMode::AlwaysAsk,
            selected_browser: None,
            in_app_browser_mode: BrowserMode::AlwaysAsk,
            selected_in_app_browser: None,
            unified_preferred_browser: true,
            in_app_browser_settings: InAppBrowserSettings::AllowAll,
            in_app_browser_disabled_packages: BTreeSet::new(),

            url_preview: false,
            url_preview_skip_browser: true,
            preview_timeout_secs: 10,
            lib_redirect_js_engine: false,
        }
    }
}

impl ResolverSettings {
    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_secs.saturating_mul(1000)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_secs(self.preview_timeout_secs)
    }

    /// True when any link modifier is switched on
    pub fn any_uri_modifier(&self) -> bool {
        self.resolve_embeds || self.use_clear_urls || self.use_fast_forward_rules
    }
}
