// src/config/mod.rs
//
// Configuration module
//
// Provides:
// - The settings snapshot type read by every pipeline stage
// - In-memory and JSON-file providers

pub mod settings;
pub mod store;

pub use settings::ResolverSettings;
pub use store::{get_settings_path, InMemorySettings, JsonSettingsStore, SettingsProvider};
