// src/services/intent_resolver.rs
//
// Intent Resolver - the resolution pipeline
//
// Order of stages:
// 1. Connectivity probe
// 2. Web search short-circuit
// 3. URI extraction and browser query
// 4. Link modifiers
// 5. Redirects
// 6. AMP → canonical
// 7. Link modifiers again
// 8. LibRedirect
// 9. Downloader check
// 10. Custom-tab decision and intent sanitizing
// 11. Preferred app and history, pruned of uninstalled packages
// 12. Handler enumeration and browser filter
// 13. Sorting
// 14. Preview
//
// CRITICAL RULES:
// - Each stage emits its ResolveEvent before doing work; modifiers only when enabled
// - Settings are read fresh by each stage
// - Module status entries are write-once per run
// - Only the preview runs as a child task; dropping `resolve` aborts it
// - Pruning is fire-and-forget and never changes what this run returns

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::config::{ResolverSettings, SettingsProvider};
use crate::domain::intent::{custom_tab_info, get_uri_from_intent, parse_search_intent};
use crate::domain::referrer::get_referring_package;
use crate::domain::{
    ActivityInfo, BrowserMode, DisplayActivityInfo, DownloadCheckResult, InAppBrowserSettings, Intent,
    IntentAction, IntentResolveResult, KnownBrowser, LibRedirectResult, ModuleStatus, PreferredApp,
    PreviewMetadata, ResolveModule, ResolveModuleStatus, ResolvedIntent, Uri,
};
use crate::error::AppResult;
use crate::events::{
    CancelHandle, EventBus, ResolutionFailed, ResolveEvent, ResolverChannels, ResolverInteraction,
    StaleRecordsPruned, UrlResolved,
};
use crate::infrastructure::RuleStore;
use crate::integrations::{ConnectivityProbe, Downloader, PackageManager, Unfurler};
use crate::repositories::{
    AppSelectionHistoryRepository, PreferredAppRepository, WhitelistedBrowsersRepository,
};
use crate::services::app_sorter;
use crate::services::browser_handler::filter_browsers;
use crate::services::lib_redirect::{consume_skip_request, LibRedirectResolver};
use crate::services::url_modifier::UrlModifierChain;
use crate::services::url_resolver::{ResolvePolicy, UrlResolver};

/// Collaborators of an [`IntentResolver`].
pub struct IntentResolverDeps {
    pub settings: Arc<dyn SettingsProvider>,
    pub rules: Arc<RuleStore>,
    pub connectivity: Arc<dyn ConnectivityProbe>,
    pub package_manager: Arc<dyn PackageManager>,
    pub preferred_apps: Arc<dyn PreferredAppRepository>,
    pub history: Arc<dyn AppSelectionHistoryRepository>,
    pub whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    pub in_app_whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    pub redirect_resolver: UrlResolver,
    pub amp_resolver: UrlResolver,
    pub lib_redirect: LibRedirectResolver,
    pub downloader: Arc<dyn Downloader>,
    pub unfurler: Arc<dyn Unfurler>,
    pub event_bus: Arc<EventBus>,
}

pub struct IntentResolver {
    settings: Arc<dyn SettingsProvider>,
    rules: Arc<RuleStore>,
    modifiers: UrlModifierChain,
    connectivity: Arc<dyn ConnectivityProbe>,
    package_manager: Arc<dyn PackageManager>,
    preferred_apps: Arc<dyn PreferredAppRepository>,
    history: Arc<dyn AppSelectionHistoryRepository>,
    whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    in_app_whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    redirect_resolver: UrlResolver,
    amp_resolver: UrlResolver,
    lib_redirect: LibRedirectResolver,
    downloader: Arc<dyn Downloader>,
    unfurler: Arc<dyn Unfurler>,
    event_bus: Arc<EventBus>,
    channels: ResolverChannels,
}

/// Preferred app and per-package history for one host, both limited to
/// installed packages.
struct AppData {
    preferred: Option<PreferredApp>,
    last_used: HashMap<String, i64>,
}

impl IntentResolver {
    pub fn new(deps: IntentResolverDeps) -> Self {
        Self {
            modifiers: UrlModifierChain::new(Arc::clone(&deps.rules)),
            settings: deps.settings,
            rules: deps.rules,
            connectivity: deps.connectivity,
            package_manager: deps.package_manager,
            preferred_apps: deps.preferred_apps,
            history: deps.history,
            whitelist: deps.whitelist,
            in_app_whitelist: deps.in_app_whitelist,
            redirect_resolver: deps.redirect_resolver,
            amp_resolver: deps.amp_resolver,
            lib_redirect: deps.lib_redirect,
            downloader: deps.downloader,
            unfurler: deps.unfurler,
            event_bus: deps.event_bus,
            channels: ResolverChannels::new(),
        }
    }

    /// Latest pipeline stage
    pub fn events(&self) -> watch::Receiver<ResolveEvent> {
        self.channels.events()
    }

    /// Cancelable work of the current run, if any
    pub fn interactions(&self) -> watch::Receiver<ResolverInteraction> {
        self.channels.interactions()
    }

    pub async fn resolve(&self, mut intent: Intent, referrer: Option<Uri>) -> IntentResolveResult {
        self.channels.emit(ResolveEvent::Initialized);
        let has_internet = self.can_access_internet().await;

        if intent.action == IntentAction::WebSearch {
            return self.resolve_web_search(&intent);
        }

        let Some(input) = get_uri_from_intent(&intent) else {
            return self.fail(IntentResolveResult::IntentParseFailed, None);
        };
        log::info!("Resolving {} (online: {})", input, has_internet);

        self.channels.emit(ResolveEvent::QueryingBrowsers);
        let browsers = self.query_browsers();

        let referrer_is_browser = KnownBrowser::is_known_browser(get_referring_package(referrer.as_ref())).is_some();

        // ====================================================================
        // LINK MODIFIERS
        // ====================================================================
        let settings = self.settings.current();
        if settings.any_uri_modifier() {
            self.channels.emit(ResolveEvent::ApplyingLinkModifiers);
        }
        let modified = match self.modifiers.apply(&input, &settings) {
            Ok(uri) => uri,
            Err(e) => {
                log::warn!("Link modifiers failed for {}: {}", input, e);
                return self.fail(IntentResolveResult::UrlModificationFailed, Some(&input));
            }
        };

        // ====================================================================
        // REDIRECT + AMP
        // ====================================================================
        let mut module_status = ResolveModuleStatus::new();

        let Some(redirected) = self
            .follow_redirects(&modified, has_internet, referrer_is_browser, &mut module_status)
            .await
        else {
            return self.fail(IntentResolveResult::ResolveUrlFailed, Some(&input));
        };

        let Some(unwrapped) = self
            .amp_to_html(&redirected, has_internet, referrer_is_browser, &mut module_status)
            .await
        else {
            return self.fail(IntentResolveResult::ResolveUrlFailed, Some(&input));
        };

        let settings = self.settings.current();
        if settings.any_uri_modifier() {
            self.channels.emit(ResolveEvent::ApplyingLinkModifiers);
        }
        let mut uri = match self.modifiers.apply(&unwrapped, &settings) {
            Ok(uri) => uri,
            Err(e) => {
                log::warn!("Link modifiers failed for {}: {}", unwrapped, e);
                return self.fail(IntentResolveResult::UrlModificationFailed, Some(&input));
            }
        };

        // ====================================================================
        // LIBREDIRECT
        // ====================================================================
        let settings = self.settings.current();
        let skip_lib_redirect = consume_skip_request(&mut intent, &settings);
        let lib_redirect_result = if settings.enable_lib_redirect && !skip_lib_redirect {
            self.channels.emit(ResolveEvent::CheckingLibRedirect);
            let result = match self.lib_redirect.resolve(&uri, settings.lib_redirect_js_engine).await {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("LibRedirect failed for {}: {}", uri, e);
                    LibRedirectResult::NotRedirected
                }
            };
            if let LibRedirectResult::Redirected { redirected_uri, .. } = &result {
                uri = redirected_uri.clone();
            }
            Some(result)
        } else {
            if skip_lib_redirect {
                log::debug!("LibRedirect skipped on request");
            }
            None
        };

        // ====================================================================
        // DOWNLOADER
        // ====================================================================
        let settings = self.settings.current();
        let downloadable = if settings.enable_downloader {
            self.channels.emit(ResolveEvent::CheckingDownloader);
            self.check_downloadable(&uri, &settings, has_internet).await
        } else {
            DownloadCheckResult::NonDownloadable
        };

        // ====================================================================
        // CUSTOM TAB + SANITIZED INTENT
        // ====================================================================
        let allow_custom_tab = allow_custom_tab(&settings, get_referring_package(referrer.as_ref()));
        let tab = custom_tab_info(&intent, allow_custom_tab);
        let new_intent = intent.sanitized(IntentAction::View, &uri, &tab.drop_extras);

        // ====================================================================
        // APPS
        // ====================================================================
        self.channels.emit(ResolveEvent::LoadingPreferredApps);
        let app_data = self.load_app_data(uri.host()).await;

        self.channels.emit(ResolveEvent::CheckingBrowsers);
        let handlers = self.package_manager.find_handlers(&new_intent).unwrap_or_else(|e| {
            log::error!("Failed to enumerate handlers for {}: {}", uri, e);
            Vec::new()
        });

        let settings = self.settings.current();
        let (mode, selected, whitelist_repo) = if tab.custom_tab && !settings.unified_preferred_browser {
            (
                settings.in_app_browser_mode,
                settings.selected_in_app_browser.clone(),
                &self.in_app_whitelist,
            )
        } else {
            (settings.browser_mode, settings.selected_browser.clone(), &self.whitelist)
        };
        let whitelist = if mode == BrowserMode::Whitelisted {
            self.load_whitelist(whitelist_repo).await
        } else {
            BTreeSet::new()
        };
        let filtered = filter_browsers(mode, selected.as_deref(), &whitelist, handlers, &browsers);

        self.channels.emit(ResolveEvent::SortingApps);
        let (is_single_option, no_browsers_only_single_app) =
            (filtered.is_single_option, filtered.no_browsers_only_single_app);
        let sorted = app_sorter::sort(
            filtered.candidates,
            app_data.preferred.as_ref(),
            &app_data.last_used,
            !settings.dont_show_filtered_item,
        );

        // ====================================================================
        // PREVIEW
        // ====================================================================
        let settings = self.settings.current();
        let preview_allowed = settings.url_preview && !(settings.url_preview_skip_browser && referrer_is_browser);
        let preview = if preview_allowed && has_internet {
            self.channels.emit(ResolveEvent::GeneratingPreview);
            self.generate_preview(&uri, settings.preview_timeout()).await
        } else {
            None
        };

        self.event_bus.emit(UrlResolved::new(
            input.to_string(),
            uri.to_string(),
            module_status
                .changed_modules()
                .iter()
                .map(ToString::to_string)
                .collect(),
        ));
        log::info!("Resolved {} → {}", input, uri);

        IntentResolveResult::Default(Box::new(ResolvedIntent {
            intent: new_intent,
            uri,
            preview,
            referrer,
            resolved: sorted.resolved,
            filtered_item: sorted.filtered_item,
            always_preferred: app_data.preferred.as_ref().map(|p| p.always_preferred),
            is_single_option,
            no_browsers_only_single_app,
            module_status,
            lib_redirect_result,
            downloadable,
        }))
    }

    // ========================================================================
    // STAGES
    // ========================================================================

    async fn can_access_internet(&self) -> bool {
        match self.connectivity.can_access_internet().await {
            Ok(online) => online,
            Err(e) => {
                log::warn!("Connectivity probe failed, assuming offline: {}", e);
                false
            }
        }
    }

    fn resolve_web_search(&self, intent: &Intent) -> IntentResolveResult {
        self.channels.emit(ResolveEvent::QueryingBrowsers);

        let Some(query) = parse_search_intent(intent) else {
            return self.fail(IntentResolveResult::IntentParseFailed, None);
        };

        let search_intent = Intent::web_search(query.clone());
        let handlers = self
            .package_manager
            .query_search_handlers(&search_intent)
            .unwrap_or_else(|e| {
                log::error!("Failed to query search handlers: {}", e);
                Vec::new()
            });
        let browsers: HashSet<String> = self
            .query_browsers()
            .into_iter()
            .map(|b| b.package_name)
            .collect();

        let candidates: Vec<DisplayActivityInfo> = handlers
            .iter()
            .map(|h| h.to_display(browsers.contains(&h.package_name), None))
            .collect();

        log::info!("Web search with {} handlers", candidates.len());
        IntentResolveResult::WebSearch {
            query,
            intent: search_intent,
            candidates,
        }
    }

    /// `None` when the redirect resolver errored.
    async fn follow_redirects(
        &self,
        uri: &Uri,
        has_internet: bool,
        referrer_is_browser: bool,
        module_status: &mut ResolveModuleStatus,
    ) -> Option<Uri> {
        let settings = self.settings.current();
        if !settings.follow_redirects || (settings.follow_redirects_skip_browser && referrer_is_browser) {
            module_status.record(ResolveModule::Redirect, ModuleStatus::skipped());
            return Some(uri.clone());
        }

        self.channels.emit(ResolveEvent::ResolvingRedirects);
        let policy = ResolvePolicy {
            use_local_cache: settings.follow_redirects_local_cache,
            use_external_service: settings.follow_redirects_external_service,
            timeout_ms: settings.request_timeout_ms(),
            has_internet,
            allow_darknets: settings.follow_redirects_allow_darknets,
        };
        let only_known_trackers = settings.follow_only_known_trackers;
        let rules = &self.rules;
        let use_external_service = policy.use_external_service;
        let predicate = |uri: &Uri| {
            (!use_external_service && !only_known_trackers) || rules.is_known_tracker(uri.host())
        };

        match self.redirect_resolver.resolve(uri, predicate, policy).await {
            Ok(outcome) => {
                module_status.record(ResolveModule::Redirect, ModuleStatus::from_outcome(uri, &outcome));
                Some(outcome.into_uri())
            }
            Err(e) => {
                log::error!("Redirect resolution failed for {}: {}", uri, e);
                module_status.record(ResolveModule::Redirect, ModuleStatus::failed());
                None
            }
        }
    }

    async fn amp_to_html(
        &self,
        uri: &Uri,
        has_internet: bool,
        referrer_is_browser: bool,
        module_status: &mut ResolveModuleStatus,
    ) -> Option<Uri> {
        let settings = self.settings.current();
        if !settings.enable_amp2html || (settings.amp2html_skip_browser && referrer_is_browser) {
            module_status.record(ResolveModule::Amp2Html, ModuleStatus::skipped());
            return Some(uri.clone());
        }

        self.channels.emit(ResolveEvent::RunningAmp2Html);
        let policy = ResolvePolicy {
            use_local_cache: settings.amp2html_local_cache,
            use_external_service: settings.amp2html_external_service,
            timeout_ms: settings.request_timeout_ms(),
            has_internet,
            allow_darknets: settings.amp2html_allow_darknets,
        };

        match self.amp_resolver.resolve(uri, |_| true, policy).await {
            Ok(outcome) => {
                module_status.record(ResolveModule::Amp2Html, ModuleStatus::from_outcome(uri, &outcome));
                Some(outcome.into_uri())
            }
            Err(e) => {
                log::error!("Amp2Html failed for {}: {}", uri, e);
                module_status.record(ResolveModule::Amp2Html, ModuleStatus::failed());
                None
            }
        }
    }

    async fn check_downloadable(
        &self,
        uri: &Uri,
        settings: &ResolverSettings,
        has_internet: bool,
    ) -> DownloadCheckResult {
        if settings.downloader_check_url_mime_type {
            let result = self.downloader.check_is_non_html_file_ending(uri);
            if result.is_downloadable() {
                log::debug!("Downloader: {} matched by file name", uri);
                return result;
            }
        }

        if !has_internet {
            return DownloadCheckResult::NonDownloadable;
        }

        match self
            .downloader
            .is_non_html_content_uri(uri, settings.request_timeout_ms())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Downloader probe failed for {}: {}", uri, e);
                DownloadCheckResult::NonDownloadable
            }
        }
    }

    fn query_browsers(&self) -> Vec<ActivityInfo> {
        self.package_manager.query_browsers().unwrap_or_else(|e| {
            log::error!("Failed to query browsers: {}", e);
            Vec::new()
        })
    }

    // ========================================================================
    // PERSISTED APP DATA
    // ========================================================================

    async fn load_app_data(&self, host: &str) -> AppData {
        let preferred = {
            let repo = Arc::clone(&self.preferred_apps);
            let host = host.to_string();
            blocking(move || repo.get_by_host(&host)).await.unwrap_or_else(|e| {
                log::error!("Failed to load preferred app: {}", e);
                None
            })
        };

        let mut last_used = {
            let repo = Arc::clone(&self.history);
            let host = host.to_string();
            blocking(move || repo.get_last_used_for_host_grouped_by_package(&host))
                .await
                .unwrap_or_else(|e| {
                    log::error!("Failed to load app history: {}", e);
                    HashMap::new()
                })
        };

        let mut packages: Vec<String> = last_used.keys().cloned().collect();
        if let Some(preferred) = &preferred {
            if !packages.contains(&preferred.package_name) {
                packages.push(preferred.package_name.clone());
            }
        }
        if packages.is_empty() {
            return AppData { preferred, last_used };
        }

        let (_, to_delete) = self.package_manager.has_launcher(&packages);
        if to_delete.is_empty() {
            return AppData { preferred, last_used };
        }

        let preferred = preferred.filter(|p| !to_delete.contains(&p.package_name));
        last_used.retain(|package, _| !to_delete.contains(package));
        self.prune_stale_records(to_delete);

        AppData { preferred, last_used }
    }

    fn prune_stale_records(&self, packages: Vec<String>) {
        log::info!("Pruning records of uninstalled packages: {:?}", packages);

        let preferred_apps = Arc::clone(&self.preferred_apps);
        let history = Arc::clone(&self.history);
        let event_bus = Arc::clone(&self.event_bus);

        tokio::spawn(async move {
            let pruned = tokio::task::spawn_blocking(move || {
                let preferred = preferred_apps.delete(&packages);
                let history = history.delete(&packages);
                (packages, preferred, history)
            })
            .await;

            match pruned {
                Ok((packages, preferred, history)) => {
                    report_pruned(&event_bus, "preferred_app", &packages, preferred);
                    report_pruned(&event_bus, "app_selection_history", &packages, history);
                }
                Err(e) => log::error!("Pruning task failed: {}", e),
            }
        });
    }

    async fn load_whitelist(&self, repo: &Arc<dyn WhitelistedBrowsersRepository>) -> BTreeSet<String> {
        let repo = Arc::clone(repo);
        blocking(move || repo.get_all()).await.unwrap_or_else(|e| {
            log::error!("Failed to load browser whitelist: {}", e);
            BTreeSet::new()
        })
    }

    // ========================================================================
    // PREVIEW
    // ========================================================================

    async fn generate_preview(&self, uri: &Uri, timeout: Duration) -> Option<PreviewMetadata> {
        let unfurler = Arc::clone(&self.unfurler);
        let url = uri.as_str().to_string();
        let task = tokio::spawn(async move { unfurler.unfurl(&url).await });

        let _guard = PreviewGuard {
            handle: task.abort_handle(),
            channels: &self.channels,
        };
        self.channels.set_interaction(ResolverInteraction::Cancelable {
            event: ResolveEvent::GeneratingPreview,
            handle: CancelHandle::new(task.abort_handle()),
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(preview))) => preview,
            Ok(Ok(Err(e))) => {
                log::warn!("Preview for {} failed: {}", uri, e);
                None
            }
            Ok(Err(e)) if e.is_cancelled() => {
                log::info!("Preview for {} cancelled", uri);
                None
            }
            Ok(Err(e)) => {
                log::error!("Preview task for {} failed: {}", uri, e);
                None
            }
            Err(_) => {
                log::warn!("Preview for {} timed out after {:?}", uri, timeout);
                None
            }
        }
    }

    fn fail(&self, result: IntentResolveResult, input: Option<&Uri>) -> IntentResolveResult {
        log::warn!("Resolution ended with {}", result.variant_name());
        self.event_bus.emit(ResolutionFailed::new(
            input.map(ToString::to_string),
            result.variant_name(),
        ));
        result
    }
}

/// Aborts the preview task and clears the interaction, however the
/// preview await ends.
struct PreviewGuard<'a> {
    handle: AbortHandle,
    channels: &'a ResolverChannels,
}

impl Drop for PreviewGuard<'_> {
    fn drop(&mut self) {
        self.handle.abort();
        self.channels.clear_interaction();
    }
}

/// Whether a custom tab may stay a custom tab for this referrer.
fn allow_custom_tab(settings: &ResolverSettings, referring_package: Option<&str>) -> bool {
    match settings.in_app_browser_settings {
        InAppBrowserSettings::AllowAll => true,
        InAppBrowserSettings::DisableAll => false,
        InAppBrowserSettings::DisableInSelectedApps => {
            !referring_package.is_some_and(|p| settings.in_app_browser_disabled_packages.contains(p))
        }
    }
}

fn report_pruned(event_bus: &EventBus, store: &str, packages: &[String], result: AppResult<usize>) {
    match result {
        Ok(0) => {}
        Ok(rows) => event_bus.emit(StaleRecordsPruned::new(store, packages.to_vec(), rows)),
        Err(e) => log::error!("Failed to prune {}: {}", store, e),
    }
}

async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::referrer::create_referrer;

    #[test]
    fn test_allow_custom_tab_per_setting() {
        let mut settings = ResolverSettings::default();
        assert!(allow_custom_tab(&settings, Some("com.example.chat")));

        settings.in_app_browser_settings = InAppBrowserSettings::DisableAll;
        assert!(!allow_custom_tab(&settings, None));

        settings.in_app_browser_settings = InAppBrowserSettings::DisableInSelectedApps;
        settings.in_app_browser_disabled_packages.insert("com.example.chat".to_string());
        let referrer = create_referrer("com.example.chat").unwrap();
        assert!(!allow_custom_tab(&settings, get_referring_package(Some(&referrer))));
        assert!(allow_custom_tab(&settings, Some("com.example.mail")));
        assert!(allow_custom_tab(&settings, None));
    }
}
