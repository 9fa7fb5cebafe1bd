// src/domain/resolution/value_objects.rs
//
// Resolution Value Objects
//
// Pure data structures describing what one resolution run produced.
//
// CRITICAL INVARIANTS:
// - ResolveModuleStatus entries are write-once per module per run
// - Every Uri carried here has scheme and host
// - No I/O operations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::app::DisplayActivityInfo;
use crate::domain::intent::Intent;
use crate::domain::Uri;

// ============================================================================
// RESOLVE MODULE STATUS
// ============================================================================

/// Optional network-backed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveModule {
    Redirect,
    Amp2Html,
}

impl std::fmt::Display for ResolveModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveModule::Redirect => write!(f, "redirect"),
            ResolveModule::Amp2Html => write!(f, "amp2html"),
        }
    }
}

/// Terminal state of a module for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Produced a URI from cache or network
    Succeeded,

    /// Not executed in this run (feature off, or suppressed for a browser referrer)
    Skipped,

    /// Executed, but policy kept it off the network for this URI
    /// (offline, darknet host, predicate rejected)
    Disabled,

    /// Executed and failed; the input URI was kept when possible
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStatus {
    pub ran: bool,
    pub changed: bool,
    pub state: ModuleState,
}

impl ModuleStatus {
    pub fn skipped() -> Self {
        Self {
            ran: false,
            changed: false,
            state: ModuleState::Skipped,
        }
    }

    pub fn from_outcome(input: &Uri, outcome: &ResolveOutcome) -> Self {
        let state = match outcome {
            ResolveOutcome::Cached(_) | ResolveOutcome::Resolved(_) => ModuleState::Succeeded,
            ResolveOutcome::Declined(_) => ModuleState::Disabled,
            ResolveOutcome::FellBack(_) => ModuleState::Failed,
        };
        Self {
            ran: true,
            changed: outcome.uri() != input,
            state,
        }
    }

    pub fn failed() -> Self {
        Self {
            ran: true,
            changed: false,
            state: ModuleState::Failed,
        }
    }
}

/// Per-run accumulator of module outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveModuleStatus {
    entries: BTreeMap<ResolveModule, ModuleStatus>,
}

impl ResolveModuleStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `module`. Returns false and keeps the first
    /// entry if the module was already recorded in this run.
    pub fn record(&mut self, module: ResolveModule, status: ModuleStatus) -> bool {
        if self.entries.contains_key(&module) {
            log::warn!("Module {} already recorded, ignoring {:?}", module, status);
            return false;
        }
        self.entries.insert(module, status);
        true
    }

    pub fn get(&self, module: ResolveModule) -> Option<&ModuleStatus> {
        self.entries.get(&module)
    }

    pub fn state_of(&self, module: ResolveModule) -> Option<ModuleState> {
        self.entries.get(&module).map(|status| status.state)
    }

    /// Modules that changed the URI
    pub fn changed_modules(&self) -> Vec<ResolveModule> {
        self.entries
            .iter()
            .filter(|(_, status)| status.changed)
            .map(|(module, _)| *module)
            .collect()
    }
}

// ============================================================================
// URL RESOLVER OUTCOME
// ============================================================================

/// What a redirect/AMP resolver did with a URI. Every variant carries a
/// usable URI; fail-open paths carry the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Served from the local cache
    Cached(Uri),

    /// Resolved over the network
    Resolved(Uri),

    /// Policy kept the resolver off the network
    Declined(Uri),

    /// Network failed or timed out; input returned unchanged
    FellBack(Uri),
}

impl ResolveOutcome {
    pub fn uri(&self) -> &Uri {
        match self {
            ResolveOutcome::Cached(uri)
            | ResolveOutcome::Resolved(uri)
            | ResolveOutcome::Declined(uri)
            | ResolveOutcome::FellBack(uri) => uri,
        }
    }

    pub fn into_uri(self) -> Uri {
        match self {
            ResolveOutcome::Cached(uri)
            | ResolveOutcome::Resolved(uri)
            | ResolveOutcome::Declined(uri)
            | ResolveOutcome::FellBack(uri) => uri,
        }
    }
}

// ============================================================================
// LIBREDIRECT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibRedirectResult {
    /// No service matched the URI
    NotRedirected,

    /// The URI was rewritten to a front-end instance
    Redirected { original_uri: Uri, redirected_uri: Uri },

    /// A service matched but the user switched it off
    Excluded { service: String },
}

// ============================================================================
// DOWNLOAD CHECK RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadCheckResult {
    #[default]
    NonDownloadable,
    Downloadable {
        file_name: Option<String>,
        mime_type: String,
    },
}

impl DownloadCheckResult {
    pub fn is_downloadable(&self) -> bool {
        matches!(self, DownloadCheckResult::Downloadable { .. })
    }
}

// ============================================================================
// PREVIEW
// ============================================================================

/// Unfurled page metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMetadata {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub favicon: Option<String>,
    pub site_name: Option<String>,
}

impl PreviewMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image_url.is_none()
    }
}

// ============================================================================
// INTENT RESOLVE RESULT (TOP-LEVEL OUTCOME)
// ============================================================================

/// The single decision object produced by one resolution run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentResolveResult {
    /// The intent carried no usable link
    IntentParseFailed,

    /// Link modifiers left the URL unparseable
    UrlModificationFailed,

    /// Redirect/AMP resolution left no usable URL
    ResolveUrlFailed,

    WebSearch {
        query: String,
        intent: Intent,
        candidates: Vec<DisplayActivityInfo>,
    },

    Default(Box<ResolvedIntent>),
}

impl IntentResolveResult {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            IntentResolveResult::IntentParseFailed
                | IntentResolveResult::UrlModificationFailed
                | IntentResolveResult::ResolveUrlFailed
        )
    }

    pub fn resolved(&self) -> Option<&ResolvedIntent> {
        match self {
            IntentResolveResult::Default(resolved) => Some(resolved),
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            IntentResolveResult::IntentParseFailed => "IntentParseFailed",
            IntentResolveResult::UrlModificationFailed => "UrlModificationFailed",
            IntentResolveResult::ResolveUrlFailed => "ResolveUrlFailed",
            IntentResolveResult::WebSearch { .. } => "WebSearch",
            IntentResolveResult::Default(_) => "Default",
        }
    }
}

/// Payload of a successful link resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIntent {
    /// Sanitized VIEW intent targeting `uri`
    pub intent: Intent,

    pub uri: Uri,

    pub preview: Option<PreviewMetadata>,

    pub referrer: Option<Uri>,

    /// Ranked candidates, without `filtered_item` unless folded back in
    pub resolved: Vec<DisplayActivityInfo>,

    /// Preferred or last-chosen app, separated from the list
    pub filtered_item: Option<DisplayActivityInfo>,

    /// `Some` when a preferred app record existed for the host
    pub always_preferred: Option<bool>,

    /// Selected-browser mode matched its browser and no app handles the link
    pub is_single_option: bool,

    /// No browser survived the filter and exactly one app handles the link
    pub no_browsers_only_single_app: bool,

    pub module_status: ResolveModuleStatus,

    /// `None` when LibRedirect did not run
    pub lib_redirect_result: Option<LibRedirectResult>,

    pub downloadable: DownloadCheckResult,
}

impl ResolvedIntent {
    /// Either single-option condition holds
    pub fn has_single_matching_option(&self) -> bool {
        self.is_single_option || self.no_browsers_only_single_app
    }
}
