// src/application/state.rs
//
// Composition root
//
// Builds the pool, repositories, rules, network clients and the resolver
// once per process. All fields are Arc-wrapped for sharing across callers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{JsonSettingsStore, SettingsProvider};
use crate::db::{create_connection_pool, get_connection, initialize_database, ConnectionPool};
use crate::domain::{
    validate_app_selection_history, validate_preferred_app, AppSelectionHistory, PreferredApp,
    ResolveModule, Uri,
};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::infrastructure::RuleStore;
use crate::integrations::{
    build_client, ExternalServiceBackend, HttpAmp2HtmlBackend, HttpDownloader, HttpRedirectBackend,
    HttpUnfurler, PackageManager, TcpConnectivityProbe, UrlResolveBackend,
};
use crate::repositories::{
    AppSelectionHistoryRepository, LibRedirectStateRepository, PreferredAppRepository,
    ResolveCacheRepository, SqliteAppSelectionHistoryRepository, SqliteLibRedirectStateRepository,
    SqlitePreferredAppRepository, SqliteResolveCacheRepository, SqliteWhitelistedBrowsersRepository,
    WhitelistKind, WhitelistedBrowsersRepository,
};
use crate::services::{IntentResolver, IntentResolverDeps, LibRedirectResolver, UrlResolver};

use super::dto::ChoiceKind;

/// Network knobs fixed at startup.
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    /// Upper bound for any single HTTP request
    pub request_timeout: Duration,

    /// Remote resolve service; redirect and AMP resolution can be delegated to it
    pub external_service_endpoint: Option<String>,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            external_service_endpoint: None,
        }
    }
}

pub struct ResolverState {
    pub settings: Arc<dyn SettingsProvider>,
    pub rules: Arc<RuleStore>,
    pub event_bus: Arc<EventBus>,
    pub package_manager: Arc<dyn PackageManager>,
    pub preferred_apps: Arc<dyn PreferredAppRepository>,
    pub history: Arc<dyn AppSelectionHistoryRepository>,
    pub whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    pub in_app_whitelist: Arc<dyn WhitelistedBrowsersRepository>,
    pub lib_redirect_state: Arc<dyn LibRedirectStateRepository>,
    pub resolver: Arc<IntentResolver>,
}

impl ResolverState {
    /// Database and settings at their platform default locations.
    pub fn open_default(package_manager: Arc<dyn PackageManager>, options: NetworkOptions) -> AppResult<Self> {
        let pool = Arc::new(create_connection_pool()?);
        let settings: Arc<dyn SettingsProvider> = Arc::new(JsonSettingsStore::open_default()?);
        Self::bootstrap(pool, settings, package_manager, options)
    }

    pub fn bootstrap(
        pool: Arc<ConnectionPool>,
        settings: Arc<dyn SettingsProvider>,
        package_manager: Arc<dyn PackageManager>,
        options: NetworkOptions,
    ) -> AppResult<Self> {
        // 1. INFRASTRUCTURE
        {
            let conn = get_connection(&pool)?;
            initialize_database(&conn)?;
        }
        let event_bus = Arc::new(EventBus::new());
        let rules = Arc::new(RuleStore::embedded()?);
        let client = build_client(options.request_timeout)?;

        // 2. REPOSITORIES
        let preferred_apps: Arc<dyn PreferredAppRepository> =
            Arc::new(SqlitePreferredAppRepository::new(Arc::clone(&pool)));
        let history: Arc<dyn AppSelectionHistoryRepository> =
            Arc::new(SqliteAppSelectionHistoryRepository::new(Arc::clone(&pool)));
        let whitelist: Arc<dyn WhitelistedBrowsersRepository> = Arc::new(
            SqliteWhitelistedBrowsersRepository::new(Arc::clone(&pool), WhitelistKind::Normal),
        );
        let in_app_whitelist: Arc<dyn WhitelistedBrowsersRepository> = Arc::new(
            SqliteWhitelistedBrowsersRepository::new(Arc::clone(&pool), WhitelistKind::InApp),
        );
        let lib_redirect_state: Arc<dyn LibRedirectStateRepository> =
            Arc::new(SqliteLibRedirectStateRepository::new(Arc::clone(&pool)));
        let cache: Arc<dyn ResolveCacheRepository> =
            Arc::new(SqliteResolveCacheRepository::new(Arc::clone(&pool)));

        // 3. NETWORK
        let external = |module: ResolveModule| {
            options.external_service_endpoint.as_deref().map(|endpoint| {
                Arc::new(ExternalServiceBackend::new(client.clone(), endpoint, module)) as Arc<dyn UrlResolveBackend>
            })
        };
        let redirect_resolver = UrlResolver::new(
            ResolveModule::Redirect,
            Arc::clone(&cache),
            Arc::new(HttpRedirectBackend::new(client.clone())),
            external(ResolveModule::Redirect),
        );
        let amp_resolver = UrlResolver::new(
            ResolveModule::Amp2Html,
            cache,
            Arc::new(HttpAmp2HtmlBackend::new(client.clone())),
            external(ResolveModule::Amp2Html),
        );

        // 4. RESOLVER
        let resolver = Arc::new(IntentResolver::new(IntentResolverDeps {
            settings: Arc::clone(&settings),
            rules: Arc::clone(&rules),
            connectivity: Arc::new(TcpConnectivityProbe::default()),
            package_manager: Arc::clone(&package_manager),
            preferred_apps: Arc::clone(&preferred_apps),
            history: Arc::clone(&history),
            whitelist: Arc::clone(&whitelist),
            in_app_whitelist: Arc::clone(&in_app_whitelist),
            redirect_resolver,
            amp_resolver,
            lib_redirect: LibRedirectResolver::new(Arc::clone(&rules), Arc::clone(&lib_redirect_state)),
            downloader: Arc::new(HttpDownloader::new(client.clone())),
            unfurler: Arc::new(HttpUnfurler::new(client)),
            event_bus: Arc::clone(&event_bus),
        }));

        log::info!("Resolver initialized");

        Ok(Self {
            settings,
            rules,
            event_bus,
            package_manager,
            preferred_apps,
            history,
            whitelist,
            in_app_whitelist,
            lib_redirect_state,
            resolver,
        })
    }

    /// Remember the app the user picked for `uri`'s host.
    ///
    /// Every choice lands in the selection history; `Always` also stores
    /// the app as the host's preferred app.
    pub fn record_choice(
        &self,
        uri: &Uri,
        package_name: &str,
        component: Option<String>,
        kind: ChoiceKind,
    ) -> AppResult<()> {
        let entry = AppSelectionHistory::new(uri.host(), package_name, Utc::now());
        validate_app_selection_history(&entry)?;

        if kind == ChoiceKind::Always {
            let preferred = PreferredApp::new(uri.host(), package_name, component, true);
            validate_preferred_app(&preferred)?;
            self.preferred_apps.save(&preferred)?;
        }

        self.history.insert(&entry)?;
        log::info!("Recorded {:?} choice of {} for {}", kind, package_name, uri.host());
        Ok(())
    }
}
