// src/lib.rs
// LinkSheet resolver - decides what happens when a link is opened
//
// Architecture:
// - Domain-centric: Uri, Intent and resolution results carry the invariants
// - Pipeline: modifiers, redirects, AMP, LibRedirect, downloader, app selection
// - Explicit: every optional stage is gated by a setting
// - Local-first: preferences and caches live in SQLite
// - Application Layer: DTO boundary for a chooser UI or the CLI

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    ActivityInfo,
    AppSelectionHistory,
    BrowserMode,
    DisplayActivityInfo,
    DownloadCheckResult,
    Intent,
    IntentAction,
    IntentResolveResult,
    LibRedirectResult,
    ModuleState,
    PreferredApp,
    PreviewMetadata,
    ResolveModule,
    ResolveModuleStatus,
    ResolvedIntent,
    Uri,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{InMemorySettings, JsonSettingsStore, ResolverSettings, SettingsProvider};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    DomainEvent,
    EventBus,
    EventLogEntry,
    ResolutionFailed,
    ResolveEvent,
    ResolverInteraction,
    StaleRecordsPruned,
    UrlResolved,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, create_memory_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{IntentResolver, IntentResolverDeps};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{NetworkOptions, ResolverState};

pub use application::commands;
pub use application::dto;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{InMemoryPackageManager, InstalledActivity, PackageManager};
