use super::entity::{AppSelectionHistory, PreferredApp};
use crate::domain::{DomainError, DomainResult};

/// Validates PreferredApp invariants before persistence
pub fn validate_preferred_app(app: &PreferredApp) -> DomainResult<()> {
    validate_host(&app.host)?;
    validate_package_name(&app.package_name)?;

    if let Some(component) = &app.component {
        let prefix = format!("{}/", app.package_name);
        if !component.starts_with(&prefix) || component.len() == prefix.len() {
            return Err(DomainError::InvariantViolation(format!(
                "Component {} does not belong to package {}",
                component, app.package_name
            )));
        }
    }
    Ok(())
}

pub fn validate_app_selection_history(entry: &AppSelectionHistory) -> DomainResult<()> {
    validate_host(&entry.host)?;
    validate_package_name(&entry.package_name)
}

fn validate_host(host: &str) -> DomainResult<()> {
    if host.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Host cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_package_name(package_name: &str) -> DomainResult<()> {
    if package_name.trim().is_empty() || package_name.contains('/') {
        return Err(DomainError::InvariantViolation(format!(
            "Invalid package name '{}'",
            package_name
        )));
    }
    Ok(())
}
