// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod app;
pub mod browser;
pub mod intent;
pub mod lib_redirect;
pub mod referrer;
pub mod resolution;
pub mod uri;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use uri::Uri;

// App Domain
pub use app::{
    validate_app_selection_history, validate_preferred_app, ActivityInfo, AppSelectionHistory,
    DisplayActivityInfo, PreferredApp,
};

// Browser Domain
pub use browser::{BrowserMode, InAppBrowserSettings, KnownBrowser};

// Intent Domain
pub use intent::{ExtraValue, Intent, IntentAction};

// LibRedirect Rules
pub use lib_redirect::{LibRedirectDefault, LibRedirectFrontend, LibRedirectService};

// Resolution Domain
pub use resolution::{
    DownloadCheckResult, IntentResolveResult, LibRedirectResult, ModuleState, ModuleStatus,
    PreviewMetadata, ResolveModule, ResolveModuleStatus, ResolveOutcome, ResolvedIntent,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of value invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
