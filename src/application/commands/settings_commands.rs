// src/application/commands/settings_commands.rs
//
// Browser whitelist and LibRedirect preference handlers

use crate::application::{
    dto::LibRedirectDefaultDto,
    error_handling::{ErrorResponse, ToErrorResponse},
    state::ResolverState,
};
use crate::domain::LibRedirectDefault;
use crate::repositories::WhitelistedBrowsersRepository;

fn whitelist(state: &ResolverState, in_app: bool) -> &dyn WhitelistedBrowsersRepository {
    if in_app {
        state.in_app_whitelist.as_ref()
    } else {
        state.whitelist.as_ref()
    }
}

// ============================================================================
// WHITELISTED BROWSERS
// ============================================================================

pub async fn list_whitelisted_browsers(state: &ResolverState, in_app: bool) -> Result<Vec<String>, ErrorResponse> {
    let packages = whitelist(state, in_app).get_all().to_error_response()?;
    Ok(packages.into_iter().collect())
}

pub async fn add_whitelisted_browser(
    package_name: String,
    in_app: bool,
    state: &ResolverState,
) -> Result<(), ErrorResponse> {
    let package_name = package_name.trim();
    if package_name.is_empty() {
        return Err(ErrorResponse::validation("Package name cannot be empty".to_string()));
    }
    whitelist(state, in_app).insert(package_name).to_error_response()
}

pub async fn remove_whitelisted_browser(
    package_name: String,
    in_app: bool,
    state: &ResolverState,
) -> Result<(), ErrorResponse> {
    whitelist(state, in_app).delete(package_name.trim()).to_error_response()
}

// ============================================================================
// LIBREDIRECT
// ============================================================================

pub async fn set_lib_redirect_enabled(
    service_key: String,
    enabled: bool,
    state: &ResolverState,
) -> Result<(), ErrorResponse> {
    if !state
        .rules
        .lib_redirect_services()
        .iter()
        .any(|compiled| compiled.service.key == service_key)
    {
        return Err(ErrorResponse::not_found("LibRedirect service"));
    }

    state
        .lib_redirect_state
        .set_enabled(&service_key, enabled)
        .to_error_response()
}

/// Store the front-end and instance to use for a service.
///
/// Both must come from the bundled rules.
pub async fn save_lib_redirect_default(
    dto: LibRedirectDefaultDto,
    state: &ResolverState,
) -> Result<(), ErrorResponse> {
    let service = state
        .rules
        .lib_redirect_services()
        .iter()
        .find(|compiled| compiled.service.key == dto.service_key)
        .map(|compiled| &compiled.service)
        .ok_or_else(|| ErrorResponse::not_found("LibRedirect service"))?;

    let frontend = service
        .frontend(&dto.frontend_key)
        .ok_or_else(|| ErrorResponse::not_found("LibRedirect frontend"))?;

    if !frontend.instances.contains(&dto.instance_url) {
        return Err(ErrorResponse::validation(format!(
            "{} is not an instance of {}",
            dto.instance_url, frontend.name
        )));
    }

    let default = LibRedirectDefault::new(&dto.service_key, &dto.frontend_key, &dto.instance_url);
    state.lib_redirect_state.save_default(&default).to_error_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::error_handling::ErrorType;
    use crate::application::state::NetworkOptions;
    use crate::config::InMemorySettings;
    use crate::db::create_memory_pool;
    use crate::integrations::InMemoryPackageManager;

    fn state() -> ResolverState {
        ResolverState::bootstrap(
            Arc::new(create_memory_pool().unwrap()),
            Arc::new(InMemorySettings::default()),
            Arc::new(InMemoryPackageManager::default()),
            NetworkOptions::default(),
        )
        .unwrap()
    }

    fn first_service(state: &ResolverState) -> (String, String, String) {
        let service = &state.rules.lib_redirect_services()[0].service;
        let frontend = &service.frontends[0];
        (service.key.clone(), frontend.key.clone(), frontend.instances[0].clone())
    }

    #[tokio::test]
    async fn test_whitelists_are_separate() {
        let state = state();

        add_whitelisted_browser("org.mozilla.firefox".to_string(), false, &state)
            .await
            .unwrap();
        add_whitelisted_browser("com.android.chrome".to_string(), true, &state)
            .await
            .unwrap();

        assert_eq!(
            list_whitelisted_browsers(&state, false).await.unwrap(),
            vec!["org.mozilla.firefox".to_string()]
        );
        assert_eq!(
            list_whitelisted_browsers(&state, true).await.unwrap(),
            vec!["com.android.chrome".to_string()]
        );

        remove_whitelisted_browser("org.mozilla.firefox".to_string(), false, &state)
            .await
            .unwrap();
        assert!(list_whitelisted_browsers(&state, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_package_is_rejected() {
        let state = state();
        let error = add_whitelisted_browser("  ".to_string(), false, &state)
            .await
            .unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let state = state();
        let error = set_lib_redirect_enabled("nope".to_string(), true, &state)
            .await
            .unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_toggle_and_save_default() {
        let state = state();
        let (service, frontend, instance) = first_service(&state);

        set_lib_redirect_enabled(service.clone(), false, &state).await.unwrap();
        assert_eq!(state.lib_redirect_state.is_enabled(&service).unwrap(), Some(false));

        let dto = LibRedirectDefaultDto {
            service_key: service.clone(),
            frontend_key: frontend.clone(),
            instance_url: instance.clone(),
        };
        save_lib_redirect_default(dto, &state).await.unwrap();

        let stored = state.lib_redirect_state.get_default(&service).unwrap().unwrap();
        assert_eq!(stored, LibRedirectDefault::new(&service, &frontend, &instance));
    }

    #[tokio::test]
    async fn test_foreign_instance_is_rejected() {
        let state = state();
        let (service, frontend, _) = first_service(&state);

        let dto = LibRedirectDefaultDto {
            service_key: service,
            frontend_key: frontend,
            instance_url: "https://not-an-instance.invalid".to_string(),
        };
        let error = save_lib_redirect_default(dto, &state).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }
}
