use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw handler entry as enumerated by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityInfo {
    pub package_name: String,
    pub activity_name: String,
    pub label: String,
    pub icon: Option<String>,
}

impl ActivityInfo {
    pub fn new(package_name: &str, activity_name: &str, label: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            activity_name: activity_name.to_string(),
            label: label.to_string(),
            icon: None,
        }
    }

    /// "package/activity"
    pub fn component_name(&self) -> String {
        format!("{}/{}", self.package_name, self.activity_name)
    }

    pub fn to_display(&self, browser: bool, last_used: Option<i64>) -> DisplayActivityInfo {
        DisplayActivityInfo {
            package_name: self.package_name.clone(),
            activity_name: self.activity_name.clone(),
            label: self.label.clone(),
            icon: self.icon.clone(),
            browser,
            last_used,
        }
    }
}

/// A candidate app as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayActivityInfo {
    pub package_name: String,
    pub activity_name: String,
    pub label: String,
    pub icon: Option<String>,

    /// Whether the app was classified as a browser
    pub browser: bool,

    /// Last time the user picked this package for the host (epoch millis)
    pub last_used: Option<i64>,
}

impl DisplayActivityInfo {
    pub fn component_name(&self) -> String {
        format!("{}/{}", self.package_name, self.activity_name)
    }

    /// Matches a preferred app by component when one is stored, by package otherwise.
    pub fn matches_preferred(&self, preferred: &PreferredApp) -> bool {
        match preferred.component.as_deref() {
            Some(component) => self.component_name() == component,
            None => self.package_name == preferred.package_name,
        }
    }
}

/// Persisted user choice for a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredApp {
    pub id: Uuid,
    pub host: String,
    pub package_name: String,

    /// "package/activity" when the choice was made for a specific activity
    pub component: Option<String>,

    /// Open this app without asking
    pub always_preferred: bool,

    pub created_at: DateTime<Utc>,
}

impl PreferredApp {
    pub fn new(host: &str, package_name: &str, component: Option<String>, always_preferred: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            host: host.to_lowercase(),
            package_name: package_name.to_string(),
            component,
            always_preferred,
            created_at: Utc::now(),
        }
    }
}

/// One selection of a package for a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSelectionHistory {
    pub id: Uuid,
    pub host: String,
    pub package_name: String,
    pub last_used: DateTime<Utc>,
}

impl AppSelectionHistory {
    pub fn new(host: &str, package_name: &str, last_used: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            host: host.to_lowercase(),
            package_name: package_name.to_string(),
            last_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_match_by_component_then_package() {
        let app = ActivityInfo::new("com.example", "com.example.Main", "Example").to_display(false, None);

        let by_package = PreferredApp::new("example.com", "com.example", None, true);
        assert!(app.matches_preferred(&by_package));

        let by_component = PreferredApp::new(
            "example.com",
            "com.example",
            Some("com.example/com.example.Other".to_string()),
            true,
        );
        assert!(!app.matches_preferred(&by_component));
    }

    #[test]
    fn test_hosts_are_lowercased() {
        let app = PreferredApp::new("Example.COM", "com.example", None, false);
        assert_eq!(app.host, "example.com");
    }
}
