// src/services/url_resolver.rs
//
// Redirect / AMP resolution policy
//
// Same shape for both modules:
// 1. Local cache, when enabled
// 2. Policy gates: offline, darknet host, predicate
// 3. Network through the local or external backend, bounded by a timeout
// 4. Cache the result
//
// CRITICAL RULES:
// - Network errors, timeouts and unusable answers return the input (fail-open)
// - Cache failures are logged, never fatal

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ResolveModule, ResolveOutcome, Uri};
use crate::error::AppResult;
use crate::integrations::UrlResolveBackend;
use crate::repositories::ResolveCacheRepository;

/// Top-level domains only reachable through overlay networks
pub const DARKNET_SUFFIXES: &[&str] = &[".onion", ".i2p", ".loki"];

pub fn is_darknet_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    DARKNET_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

/// Per-call knobs, read from settings by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub use_local_cache: bool,
    pub use_external_service: bool,
    pub timeout_ms: u64,
    pub has_internet: bool,
    pub allow_darknets: bool,
}

pub struct UrlResolver {
    module: ResolveModule,
    cache: Arc<dyn ResolveCacheRepository>,
    local: Arc<dyn UrlResolveBackend>,
    external: Option<Arc<dyn UrlResolveBackend>>,
}

impl UrlResolver {
    pub fn new(
        module: ResolveModule,
        cache: Arc<dyn ResolveCacheRepository>,
        local: Arc<dyn UrlResolveBackend>,
        external: Option<Arc<dyn UrlResolveBackend>>,
    ) -> Self {
        Self {
            module,
            cache,
            local,
            external,
        }
    }

    pub fn module(&self) -> ResolveModule {
        self.module
    }

    pub async fn resolve<P>(&self, uri: &Uri, predicate: P, policy: ResolvePolicy) -> AppResult<ResolveOutcome>
    where
        P: Fn(&Uri) -> bool,
    {
        if policy.use_local_cache {
            if let Some(cached) = self.cache_get(uri).await {
                log::debug!("{}: cache hit for {}", self.module, uri);
                return Ok(ResolveOutcome::Cached(cached));
            }
        }

        if !policy.has_internet {
            log::debug!("{}: offline, keeping {}", self.module, uri);
            return Ok(ResolveOutcome::Declined(uri.clone()));
        }

        if !policy.allow_darknets && is_darknet_host(uri.host()) {
            log::debug!("{}: darknet host {} not allowed", self.module, uri.host());
            return Ok(ResolveOutcome::Declined(uri.clone()));
        }

        if !predicate(uri) {
            log::debug!("{}: predicate declined {}", self.module, uri);
            return Ok(ResolveOutcome::Declined(uri.clone()));
        }

        let backend = self.backend(policy.use_external_service);
        let resolved = match tokio::time::timeout(Duration::from_millis(policy.timeout_ms), backend.resolve(uri)).await {
            Ok(Ok(resolved)) => resolved,
            Ok(Err(e)) => {
                log::warn!("{}: resolving {} failed, keeping it: {}", self.module, uri, e);
                return Ok(ResolveOutcome::FellBack(uri.clone()));
            }
            Err(_) => {
                log::warn!("{}: resolving {} timed out after {}ms", self.module, uri, policy.timeout_ms);
                return Ok(ResolveOutcome::FellBack(uri.clone()));
            }
        };

        let resolved = match Uri::parse(&resolved) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("{}: backend returned unusable URL '{}', keeping {}: {}", self.module, resolved, uri, e);
                return Ok(ResolveOutcome::FellBack(uri.clone()));
            }
        };

        if policy.use_local_cache {
            self.cache_put(uri, &resolved).await;
        }

        Ok(ResolveOutcome::Resolved(resolved))
    }

    fn backend(&self, use_external_service: bool) -> &Arc<dyn UrlResolveBackend> {
        match (&self.external, use_external_service) {
            (Some(external), true) => external,
            (None, true) => {
                log::warn!("{}: external service requested but not configured, resolving locally", self.module);
                &self.local
            }
            _ => &self.local,
        }
    }

    async fn cache_get(&self, uri: &Uri) -> Option<Uri> {
        let cache = Arc::clone(&self.cache);
        let module = self.module;
        let input = uri.as_str().to_string();

        let cached = match tokio::task::spawn_blocking(move || cache.get(module, &input)).await {
            Ok(Ok(cached)) => cached?,
            Ok(Err(e)) => {
                log::error!("{}: cache read failed: {}", self.module, e);
                return None;
            }
            Err(e) => {
                log::error!("{}: cache read task failed: {}", self.module, e);
                return None;
            }
        };

        match Uri::parse(&cached) {
            Ok(uri) => Some(uri),
            Err(e) => {
                log::warn!("{}: ignoring unusable cached URL '{}': {}", self.module, cached, e);
                None
            }
        }
    }

    async fn cache_put(&self, input: &Uri, resolved: &Uri) {
        let cache = Arc::clone(&self.cache);
        let module = self.module;
        let input = input.as_str().to_string();
        let resolved = resolved.as_str().to_string();

        match tokio::task::spawn_blocking(move || cache.insert(module, &input, &resolved)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("{}: cache write failed: {}", self.module, e),
            Err(e) => log::error!("{}: cache write task failed: {}", self.module, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::error::AppError;
    use crate::integrations::url_backend::MockUrlResolveBackend;
    use crate::repositories::{MockResolveCacheRepository, SqliteResolveCacheRepository};

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn online() -> ResolvePolicy {
        ResolvePolicy {
            use_local_cache: true,
            use_external_service: false,
            timeout_ms: 1_000,
            has_internet: true,
            allow_darknets: false,
        }
    }

    fn sqlite_cache() -> Arc<dyn ResolveCacheRepository> {
        Arc::new(SqliteResolveCacheRepository::new(Arc::new(create_memory_pool().unwrap())))
    }

    fn backend_returning(url: &'static str, times: usize) -> Arc<dyn UrlResolveBackend> {
        let mut backend = MockUrlResolveBackend::new();
        backend.expect_resolve().times(times).returning(move |_| Ok(url.to_string()));
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let resolver = UrlResolver::new(
            ResolveModule::Redirect,
            sqlite_cache(),
            backend_returning("https://example.com/landing", 1),
            None,
        );
        let input = uri("https://t.co/abc");

        let first = resolver.resolve(&input, |_| true, online()).await.unwrap();
        assert_eq!(first, ResolveOutcome::Resolved(uri("https://example.com/landing")));

        // second call is served from cache; the backend expects exactly one call
        let second = resolver.resolve(&input, |_| true, online()).await.unwrap();
        assert_eq!(second, ResolveOutcome::Cached(uri("https://example.com/landing")));
    }

    #[tokio::test]
    async fn test_offline_never_touches_network() {
        let resolver = UrlResolver::new(ResolveModule::Redirect, sqlite_cache(), backend_returning("", 0), None);
        let input = uri("https://t.co/abc");
        let policy = ResolvePolicy { has_internet: false, ..online() };

        let outcome = resolver.resolve(&input, |_| true, policy).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Declined(input));
    }

    #[tokio::test]
    async fn test_offline_still_uses_cache() {
        let cache = sqlite_cache();
        cache.insert(ResolveModule::Amp2Html, "https://amp.example.com/p", "https://example.com/p").unwrap();
        let resolver = UrlResolver::new(ResolveModule::Amp2Html, cache, backend_returning("", 0), None);
        let policy = ResolvePolicy { has_internet: false, ..online() };

        let outcome = resolver.resolve(&uri("https://amp.example.com/p"), |_| true, policy).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Cached(uri("https://example.com/p")));
    }

    #[tokio::test]
    async fn test_darknet_and_predicate_gates() {
        let resolver = UrlResolver::new(ResolveModule::Redirect, sqlite_cache(), backend_returning("", 0), None);

        let onion = uri("http://exampleonionaddress.onion/x");
        let outcome = resolver.resolve(&onion, |_| true, online()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Declined(onion));

        let plain = uri("https://example.com/x");
        let outcome = resolver.resolve(&plain, |_| false, online()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Declined(plain));
    }

    #[tokio::test]
    async fn test_network_error_falls_back_to_input() {
        let mut backend = MockUrlResolveBackend::new();
        backend
            .expect_resolve()
            .returning(|_| Err(AppError::Other("connection reset".to_string())));
        let resolver = UrlResolver::new(ResolveModule::Redirect, sqlite_cache(), Arc::new(backend), None);

        let input = uri("https://t.co/abc");
        let outcome = resolver.resolve(&input, |_| true, online()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::FellBack(input));
    }

    #[tokio::test]
    async fn test_unusable_backend_answer_falls_back_uncached() {
        let cache = sqlite_cache();
        let resolver = UrlResolver::new(
            ResolveModule::Redirect,
            Arc::clone(&cache),
            backend_returning("not a url", 1),
            None,
        );
        let input = uri("https://t.co/abc");

        let outcome = resolver.resolve(&input, |_| true, online()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::FellBack(input.clone()));
        assert_eq!(cache.get(ResolveModule::Redirect, input.as_str()).unwrap(), None);
    }

    #[tokio::test]
    async fn test_external_backend_selected_when_requested() {
        let resolver = UrlResolver::new(
            ResolveModule::Redirect,
            sqlite_cache(),
            backend_returning("https://local.example/", 0),
            Some(backend_returning("https://external.example/", 1)),
        );
        let policy = ResolvePolicy { use_external_service: true, use_local_cache: false, ..online() };

        let outcome = resolver.resolve(&uri("https://t.co/abc"), |_| true, policy).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Resolved(uri("https://external.example/")));
    }

    #[tokio::test]
    async fn test_cache_read_failure_is_not_fatal() {
        let mut cache = MockResolveCacheRepository::new();
        cache.expect_get().returning(|_, _| Err(AppError::Pool("exhausted".to_string())));
        cache.expect_insert().returning(|_, _, _| Ok(()));
        let resolver = UrlResolver::new(
            ResolveModule::Redirect,
            Arc::new(cache),
            backend_returning("https://example.com/", 1),
            None,
        );

        let outcome = resolver.resolve(&uri("https://t.co/abc"), |_| true, online()).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Resolved(uri("https://example.com/")));
    }

    #[test]
    fn test_is_darknet_host() {
        assert!(is_darknet_host("abc.onion"));
        assert!(is_darknet_host("site.I2P"));
        assert!(!is_darknet_host("onion.example.com"));
    }
}
