// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO pruning decisions (services decide what is stale)
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only

pub mod app_selection_history_repository;
pub mod lib_redirect_repository;
pub mod preferred_app_repository;
pub mod resolve_cache_repository;
pub mod whitelisted_browsers_repository;

pub use app_selection_history_repository::{AppSelectionHistoryRepository, SqliteAppSelectionHistoryRepository};
pub use lib_redirect_repository::{LibRedirectStateRepository, SqliteLibRedirectStateRepository};
pub use preferred_app_repository::{PreferredAppRepository, SqlitePreferredAppRepository};
pub use resolve_cache_repository::{cache_key, ResolveCacheRepository, SqliteResolveCacheRepository};
pub use whitelisted_browsers_repository::{
    SqliteWhitelistedBrowsersRepository, WhitelistKind, WhitelistedBrowsersRepository,
};

#[cfg(test)]
pub use app_selection_history_repository::MockAppSelectionHistoryRepository;
#[cfg(test)]
pub use lib_redirect_repository::MockLibRedirectStateRepository;
#[cfg(test)]
pub use preferred_app_repository::MockPreferredAppRepository;
#[cfg(test)]
pub use resolve_cache_repository::MockResolveCacheRepository;
#[cfg(test)]
pub use whitelisted_browsers_repository::MockWhitelistedBrowsersRepository;
