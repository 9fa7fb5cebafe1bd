// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod app_sorter;
pub mod browser_handler;
pub mod intent_resolver;
pub mod lib_redirect;
pub mod url_modifier;
pub mod url_resolver;


// Re-export all services and their types
pub use app_sorter::SortedApps;

pub use browser_handler::{
    filter_browsers,
    FilteredBrowserList,
};

pub use intent_resolver::{
    IntentResolver,
    IntentResolverDeps,
};

pub use lib_redirect::{
    consume_skip_request,
    swap_host,
    LibRedirectResolver,
};

pub use url_modifier::UrlModifierChain;

pub use url_resolver::{
    is_darknet_host,
    ResolvePolicy,
    UrlResolver,
    DARKNET_SUFFIXES,
};
