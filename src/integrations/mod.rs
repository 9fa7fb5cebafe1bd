// src/integrations/mod.rs
//
// External Integrations Module
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Network and platform concerns only; no resolution policy
// - Every integration sits behind a trait the services depend on

pub mod connectivity;
pub mod downloader;
pub mod html;
pub mod http;
pub mod package_manager;
pub mod script_engine;
pub mod unfurl;
pub mod url_backend;

pub use connectivity::{ConnectivityProbe, TcpConnectivityProbe};
pub use downloader::{Downloader, HttpDownloader};
pub use http::build_client;
pub use package_manager::{HandlerFilter, InMemoryPackageManager, InstalledActivity, PackageManager};
pub use script_engine::run_redirect_script;
pub use unfurl::{HttpUnfurler, Unfurler};
pub use url_backend::{
    ExternalServiceBackend, HttpAmp2HtmlBackend, HttpRedirectBackend, UrlResolveBackend,
};
