// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are UI-friendly representations
// - DTOs are simple, serializable structs
// - Conversion FROM domain results only (never TO)

use serde::{Deserialize, Serialize};

use crate::domain::referrer::get_referring_package;
use crate::domain::{
    DisplayActivityInfo, DownloadCheckResult, Intent, IntentResolveResult, LibRedirectResult,
    PreviewMetadata, ResolveModuleStatus, ResolvedIntent,
};

// ============================================================================
// BOTTOM SHEET
// ============================================================================

/// What the chooser sheet renders for one resolution run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BottomSheetResult {
    Success(Box<BottomSheetSuccess>),

    WebSearch {
        query: String,
        intent: Intent,
        resolved: Vec<DisplayActivityInfo>,
    },

    /// Terminal failure; `reason` is the result variant name
    Failure { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BottomSheetSuccess {
    pub intent: Intent,
    pub uri: String,
    pub referrer: Option<String>,
    pub preview: Option<PreviewMetadata>,
    pub resolved: Vec<DisplayActivityInfo>,
    pub filtered_item: Option<DisplayActivityInfo>,
    pub module_status: ResolveModuleStatus,
    pub lib_redirect_result: Option<LibRedirectResult>,
    pub downloadable: DownloadCheckResult,

    /// A preferred app exists, is marked "always" and is installed
    pub is_regular_preferred_app: bool,

    /// Open `app()` right away instead of showing the sheet
    pub has_auto_launch_app: bool,

    total_count: usize,
}

impl BottomSheetSuccess {
    pub fn from_resolved(resolved: ResolvedIntent) -> Self {
        let referring_package = get_referring_package(resolved.referrer.as_ref()).map(str::to_string);
        let is_regular_preferred_app = resolved.always_preferred == Some(true) && resolved.filtered_item.is_some();
        let total_count = resolved.resolved.len() + usize::from(resolved.filtered_item.is_some());

        let app_package = resolved
            .filtered_item
            .as_ref()
            .or_else(|| resolved.resolved.first())
            .map(|app| app.package_name.clone());

        // Never bounce the link straight back into the app that sent it
        let launches_referrer = match (&referring_package, &app_package) {
            (Some(referrer), Some(app)) => referrer == app,
            _ => false,
        };
        let has_auto_launch_app = app_package.is_some()
            && (is_regular_preferred_app || resolved.has_single_matching_option())
            && !launches_referrer;

        Self {
            intent: resolved.intent,
            uri: resolved.uri.to_string(),
            referrer: resolved.referrer.map(|r| r.to_string()),
            preview: resolved.preview,
            resolved: resolved.resolved,
            filtered_item: resolved.filtered_item,
            module_status: resolved.module_status,
            lib_redirect_result: resolved.lib_redirect_result,
            downloadable: resolved.downloadable,
            is_regular_preferred_app,
            has_auto_launch_app,
            total_count,
        }
    }

    /// Candidates including the filtered item
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Filtered item, else the top-ranked candidate
    pub fn app(&self) -> Option<&DisplayActivityInfo> {
        self.filtered_item.as_ref().or_else(|| self.resolved.first())
    }
}

impl BottomSheetResult {
    pub fn is_empty(&self) -> bool {
        match self {
            BottomSheetResult::Success(success) => success.is_empty(),
            BottomSheetResult::WebSearch { resolved, .. } => resolved.is_empty(),
            BottomSheetResult::Failure { .. } => true,
        }
    }
}

impl From<IntentResolveResult> for BottomSheetResult {
    fn from(result: IntentResolveResult) -> Self {
        match result {
            IntentResolveResult::Default(resolved) => {
                BottomSheetResult::Success(Box::new(BottomSheetSuccess::from_resolved(*resolved)))
            }
            IntentResolveResult::WebSearch { query, intent, candidates } => BottomSheetResult::WebSearch {
                query,
                intent,
                resolved: candidates,
            },
            failure => BottomSheetResult::Failure {
                reason: failure.variant_name().to_string(),
            },
        }
    }
}

// ============================================================================
// REQUEST DTOs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    View,
    Send,
    WebSearch,
}

/// An incoming link as the chooser receives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRequestDto {
    pub action: LinkAction,

    /// URL for `view`, shared text for `send`, query for `web_search`
    pub payload: String,

    pub referrer_package: Option<String>,
}

impl LinkRequestDto {
    pub fn view(url: &str) -> Self {
        Self {
            action: LinkAction::View,
            payload: url.to_string(),
            referrer_package: None,
        }
    }

    pub fn to_intent(&self) -> Intent {
        match self.action {
            LinkAction::View => Intent::view(self.payload.as_str()),
            LinkAction::Send => Intent::send_text(self.payload.as_str()),
            LinkAction::WebSearch => Intent::web_search(self.payload.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibRedirectDefaultDto {
    pub service_key: String,
    pub frontend_key: String,
    pub instance_url: String,
}

// ============================================================================
// CHOICE DTOs
// ============================================================================

/// How long a choice in the sheet should stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    JustOnce,
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppChoiceDto {
    pub uri: String,
    pub package_name: String,
    pub activity_name: Option<String>,
    pub kind: ChoiceKind,
}
