// src/integrations/package_manager.rs
//
// Installed-app queries
//
// The platform implementation lives with the host application; the
// in-memory registry below backs embedding and tests.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::{ActivityInfo, Intent, IntentAction, Uri};
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait PackageManager: Send + Sync {
    /// Activities able to handle `intent`, in platform order
    fn find_handlers(&self, intent: &Intent) -> AppResult<Vec<ActivityInfo>>;

    /// Every installed browser
    fn query_browsers(&self) -> AppResult<Vec<ActivityInfo>>;

    fn query_search_handlers(&self, intent: &Intent) -> AppResult<Vec<ActivityInfo>>;

    /// Split `packages` into (installed, to_delete)
    fn has_launcher(&self, packages: &[String]) -> (Vec<String>, Vec<String>);

    fn launcher_for(&self, package_name: &str) -> Option<ActivityInfo>;
}

/// What an installed activity declares it can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerFilter {
    /// Any http(s) URL; browsers declare this
    AnyWebUrl,

    /// http(s) URLs on a host or one of its subdomains
    Host(String),

    WebSearch,
}

impl HandlerFilter {
    fn matches_uri(&self, uri: &Uri) -> bool {
        match self {
            HandlerFilter::AnyWebUrl => uri.is_http(),
            HandlerFilter::Host(host) => {
                let target = uri.host().to_lowercase();
                uri.is_http() && (target == *host || target.ends_with(&format!(".{}", host)))
            }
            HandlerFilter::WebSearch => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstalledActivity {
    pub activity: ActivityInfo,
    pub filters: Vec<HandlerFilter>,
    pub launcher: bool,
}

impl InstalledActivity {
    pub fn browser(activity: ActivityInfo) -> Self {
        Self {
            activity,
            filters: vec![HandlerFilter::AnyWebUrl, HandlerFilter::WebSearch],
            launcher: true,
        }
    }

    pub fn app_for_host(activity: ActivityInfo, host: &str) -> Self {
        Self {
            activity,
            filters: vec![HandlerFilter::Host(host.to_lowercase())],
            launcher: true,
        }
    }

    fn is_browser(&self) -> bool {
        self.filters.contains(&HandlerFilter::AnyWebUrl)
    }
}

/// Package registry kept in memory; insertion order is enumeration order.
#[derive(Debug, Default)]
pub struct InMemoryPackageManager {
    activities: RwLock<Vec<InstalledActivity>>,
}

impl InMemoryPackageManager {
    pub fn new(activities: Vec<InstalledActivity>) -> Self {
        Self {
            activities: RwLock::new(activities),
        }
    }

    pub fn install(&self, activity: InstalledActivity) {
        self.activities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(activity);
    }

    pub fn uninstall(&self, package_name: &str) {
        self.activities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|a| a.activity.package_name != package_name);
    }

    fn collect<F>(&self, predicate: F) -> Vec<ActivityInfo>
    where
        F: Fn(&InstalledActivity) -> bool,
    {
        self.activities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| predicate(a))
            .map(|a| a.activity.clone())
            .collect()
    }
}

impl PackageManager for InMemoryPackageManager {
    fn find_handlers(&self, intent: &Intent) -> AppResult<Vec<ActivityInfo>> {
        let Some(uri) = intent.data.as_deref().and_then(|data| Uri::parse(data).ok()) else {
            return Ok(Vec::new());
        };
        if intent.action != IntentAction::View {
            return Ok(Vec::new());
        }
        Ok(self.collect(|a| a.filters.iter().any(|f| f.matches_uri(&uri))))
    }

    fn query_browsers(&self) -> AppResult<Vec<ActivityInfo>> {
        Ok(self.collect(InstalledActivity::is_browser))
    }

    fn query_search_handlers(&self, intent: &Intent) -> AppResult<Vec<ActivityInfo>> {
        if intent.action != IntentAction::WebSearch {
            return Ok(Vec::new());
        }
        Ok(self.collect(|a| a.filters.contains(&HandlerFilter::WebSearch)))
    }

    fn has_launcher(&self, packages: &[String]) -> (Vec<String>, Vec<String>) {
        let activities = self.activities.read().unwrap_or_else(PoisonError::into_inner);
        let launchable: BTreeMap<&str, bool> = activities
            .iter()
            .filter(|a| a.launcher)
            .map(|a| (a.activity.package_name.as_str(), true))
            .collect();

        packages
            .iter()
            .cloned()
            .partition(|package| launchable.contains_key(package.as_str()))
    }

    fn launcher_for(&self, package_name: &str) -> Option<ActivityInfo> {
        self.activities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.launcher && a.activity.package_name == package_name)
            .map(|a| a.activity.clone())
    }
}
