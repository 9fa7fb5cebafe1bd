// src/config/store.rs
//
// Settings providers
//
// PRINCIPLES:
// - Callers take a fresh snapshot whenever they need a value
// - Writes replace the whole snapshot

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::settings::ResolverSettings;
use crate::error::{AppError, AppResult};

/// Source of the current settings snapshot.
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> ResolverSettings;
}

/// Process-local settings, mostly for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    settings: RwLock<ResolverSettings>,
}

impl InMemorySettings {
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ResolverSettings),
    {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl SettingsProvider for InMemorySettings {
    fn current(&self) -> ResolverSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Settings persisted as JSON on disk.
///
/// The file is read once on open; `update` writes it back atomically
/// (write to a sibling temp file, then rename).
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    settings: RwLock<ResolverSettings>,
}

/// Get the settings file path
///
/// Path structure: {CONFIG_DIR}/linksheet/settings.json
pub fn get_settings_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Other("Could not determine config directory".to_string()))?;

    let linksheet_dir = config_dir.join("linksheet");
    std::fs::create_dir_all(&linksheet_dir)?;

    Ok(linksheet_dir.join("settings.json"))
}

impl JsonSettingsStore {
    /// Open the store at the default location.
    pub fn open_default() -> AppResult<Self> {
        Self::open(get_settings_path()?)
    }

    /// Open the store at `path`. A missing file yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let settings = load_settings(&path)?;
        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn update<F>(&self, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut ResolverSettings),
    {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        f(&mut next);
        save_settings(&self.path, &next)?;
        *guard = next;
        Ok(())
    }
}

impl SettingsProvider for JsonSettingsStore {
    fn current(&self) -> ResolverSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn load_settings(path: &Path) -> AppResult<ResolverSettings> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No settings at {}, using defaults", path.display());
            Ok(ResolverSettings::default())
        }
        Err(e) => Err(AppError::Io(e)),
    }
}

fn save_settings(path: &Path, settings: &ResolverSettings) -> AppResult<()> {
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
