// events/resolve_state.rs
//
// Progress and interaction streams of a resolver.
//
// Both streams are single-slot: a subscriber sees the latest value and
// may miss intermediate ones. Publishing never blocks and never fails,
// even with no subscriber attached.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;

// ============================================================================
// PROGRESS EVENTS
// ============================================================================

/// Pipeline stage currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveEvent {
    Initialized,
    QueryingBrowsers,
    ApplyingLinkModifiers,
    ResolvingRedirects,
    RunningAmp2Html,
    CheckingLibRedirect,
    CheckingDownloader,
    LoadingPreferredApps,
    CheckingBrowsers,
    SortingApps,
    GeneratingPreview,
}

impl std::fmt::Display for ResolveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ResolveEvent::Initialized => "Initialized",
            ResolveEvent::QueryingBrowsers => "Querying browsers",
            ResolveEvent::ApplyingLinkModifiers => "Applying link modifiers",
            ResolveEvent::ResolvingRedirects => "Resolving redirects",
            ResolveEvent::RunningAmp2Html => "Running Amp2Html",
            ResolveEvent::CheckingLibRedirect => "Checking LibRedirect",
            ResolveEvent::CheckingDownloader => "Checking downloader",
            ResolveEvent::LoadingPreferredApps => "Loading preferred apps",
            ResolveEvent::CheckingBrowsers => "Checking browsers",
            ResolveEvent::SortingApps => "Sorting apps",
            ResolveEvent::GeneratingPreview => "Generating preview",
        };
        write!(f, "{}", text)
    }
}

// ============================================================================
// INTERACTIONS
// ============================================================================

/// Aborts the task it was created from. Cloning shares the same task.
#[derive(Clone)]
pub struct CancelHandle(Arc<AbortHandle>);

impl CancelHandle {
    pub fn new(handle: AbortHandle) -> Self {
        Self(Arc::new(handle))
    }

    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl PartialEq for CancelHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Something the user can act on while a run is in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolverInteraction {
    #[default]
    Clear,

    /// `event` is running and may be skipped through `handle`
    Cancelable { event: ResolveEvent, handle: CancelHandle },
}

impl ResolverInteraction {
    /// Cancel the bound task. Returns false when there is nothing to cancel.
    pub fn cancel(&self) -> bool {
        match self {
            ResolverInteraction::Clear => false,
            ResolverInteraction::Cancelable { event, handle } => {
                log::info!("Cancelling {}", event);
                handle.cancel();
                true
            }
        }
    }
}

// ============================================================================
// CHANNELS
// ============================================================================

/// Publishing side of both streams, owned by one resolver.
#[derive(Debug)]
pub struct ResolverChannels {
    events: watch::Sender<ResolveEvent>,
    interactions: watch::Sender<ResolverInteraction>,
}

impl ResolverChannels {
    pub fn new() -> Self {
        let (events, _) = watch::channel(ResolveEvent::Initialized);
        let (interactions, _) = watch::channel(ResolverInteraction::Clear);
        Self { events, interactions }
    }

    pub fn emit(&self, event: ResolveEvent) {
        log::debug!("Resolve event: {}", event);
        self.events.send_replace(event);
    }

    pub fn set_interaction(&self, interaction: ResolverInteraction) {
        self.interactions.send_replace(interaction);
    }

    pub fn clear_interaction(&self) {
        self.interactions.send_replace(ResolverInteraction::Clear);
    }

    pub fn current_event(&self) -> ResolveEvent {
        *self.events.borrow()
    }

    pub fn events(&self) -> watch::Receiver<ResolveEvent> {
        self.events.subscribe()
    }

    pub fn interactions(&self) -> watch::Receiver<ResolverInteraction> {
        self.interactions.subscribe()
    }
}

impl Default for ResolverChannels {
    fn default() -> Self {
        Self::new()
    }
}
