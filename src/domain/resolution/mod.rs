// src/domain/resolution/mod.rs
//
// Resolution Domain
//
// Value objects describing the outcome of one intent resolution run.
//
// CRITICAL RULES:
// - All types are pure value objects
// - No persistence
// - No event emission (that's the service's job)

pub mod value_objects;

pub use value_objects::{
    DownloadCheckResult, IntentResolveResult, LibRedirectResult, ModuleState, ModuleStatus,
    PreviewMetadata, ResolveModule, ResolveModuleStatus, ResolveOutcome, ResolvedIntent,
};
