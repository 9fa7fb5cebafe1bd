// src/services/lib_redirect.rs
//
// LibRedirect: rewrite links to privacy-respecting front-ends.
//
// CRITICAL RULES:
// - A service the user never toggled counts as enabled
// - Plain rules swap scheme + host (+ port) and keep path, query, fragment
// - Script rules run in a fresh JS context on the blocking pool; a
//   failing script falls back to the plain rule

use std::sync::Arc;

use url::Url;

use crate::config::ResolverSettings;
use crate::domain::intent::EXTRA_LIB_REDIRECT_IGNORE;
use crate::domain::{
    ExtraValue, Intent, LibRedirectDefault, LibRedirectFrontend, LibRedirectResult, LibRedirectService, Uri,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::RuleStore;
use crate::integrations::run_redirect_script;
use crate::repositories::LibRedirectStateRepository;

/// Read and remove the per-request skip flag.
///
/// The flag is always consumed; it only takes effect when the settings
/// permit the "ignore LibRedirect" button.
pub fn consume_skip_request(intent: &mut Intent, settings: &ResolverSettings) -> bool {
    let requested = matches!(
        intent.remove_extra(EXTRA_LIB_REDIRECT_IGNORE),
        Some(ExtraValue::Bool(true))
    );
    requested && settings.enable_ignore_lib_redirect_button
}

pub struct LibRedirectResolver {
    rules: Arc<RuleStore>,
    state: Arc<dyn LibRedirectStateRepository>,
}

impl LibRedirectResolver {
    pub fn new(rules: Arc<RuleStore>, state: Arc<dyn LibRedirectStateRepository>) -> Self {
        Self { rules, state }
    }

    pub async fn resolve(&self, uri: &Uri, use_script_engine: bool) -> AppResult<LibRedirectResult> {
        let Some(compiled) = self.rules.find_lib_redirect_service(uri.as_str()) else {
            return Ok(LibRedirectResult::NotRedirected);
        };
        let service = compiled.service.clone();

        let (enabled, default) = {
            let state = Arc::clone(&self.state);
            let key = service.key.clone();
            tokio::task::spawn_blocking(move || -> AppResult<_> {
                Ok((state.is_enabled(&key)?, state.get_default(&key)?))
            })
            .await??
        };

        if enabled == Some(false) {
            log::debug!("LibRedirect: service '{}' is disabled", service.key);
            return Ok(LibRedirectResult::Excluded { service: service.key });
        }

        let Some((frontend, instance)) = choose_instance(&service, default.as_ref()) else {
            log::warn!("LibRedirect: service '{}' has no usable instance", service.key);
            return Ok(LibRedirectResult::NotRedirected);
        };

        let redirected = match (&frontend.script, use_script_engine) {
            (Some(script), true) => {
                match self.run_script(script.clone(), uri, instance.clone()).await {
                    Ok(Some(redirected)) => redirected,
                    Ok(None) => return Ok(LibRedirectResult::NotRedirected),
                    Err(e) => {
                        log::warn!("LibRedirect: script for '{}' failed, using host swap: {}", frontend.key, e);
                        swap_host(uri, &instance)?
                    }
                }
            }
            _ => swap_host(uri, &instance)?,
        };

        if redirected == *uri {
            return Ok(LibRedirectResult::NotRedirected);
        }

        log::info!("LibRedirect: {} → {} via {}", uri, redirected, frontend.name);
        Ok(LibRedirectResult::Redirected {
            original_uri: uri.clone(),
            redirected_uri: redirected,
        })
    }

    async fn run_script(&self, script: String, uri: &Uri, instance: String) -> AppResult<Option<Uri>> {
        let url = uri.as_str().to_string();
        let output = tokio::task::spawn_blocking(move || run_redirect_script(&script, &url, &instance)).await??;

        output
            .map(|redirected| Uri::parse(&redirected).map_err(AppError::from))
            .transpose()
    }
}

/// Persisted choice when it still exists in the rules, else the
/// service's fallback front-end and its first instance.
fn choose_instance(
    service: &LibRedirectService,
    default: Option<&LibRedirectDefault>,
) -> Option<(LibRedirectFrontend, String)> {
    if let Some(default) = default {
        if let Some(frontend) = service.frontend(&default.frontend_key) {
            return Some((frontend.clone(), default.instance_url.clone()));
        }
        log::warn!(
            "LibRedirect: stored front-end '{}' no longer exists for '{}'",
            default.frontend_key,
            service.key
        );
    }

    let frontend = service.fallback_frontend()?;
    let instance = frontend.instances.first()?.clone();
    Some((frontend.clone(), instance))
}

/// Replace scheme, host and port of `uri` with those of `instance`.
pub fn swap_host(uri: &Uri, instance: &str) -> AppResult<Uri> {
    let instance = Url::parse(instance)?;
    let host = instance
        .host_str()
        .ok_or_else(|| AppError::InvalidUri(format!("Instance without host: {}", instance)))?;

    let mut url = uri.url().clone();
    url.set_scheme(instance.scheme())
        .map_err(|_| AppError::InvalidUri(format!("Cannot switch {} to {}", uri, instance.scheme())))?;
    url.set_host(Some(host))?;
    url.set_port(instance.port())
        .map_err(|_| AppError::InvalidUri(format!("Cannot set port on {}", uri)))?;

    Ok(Uri::from_url(url)?)
}
