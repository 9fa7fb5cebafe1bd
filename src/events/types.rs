// events/types.rs
//
// Durable domain facts emitted by the resolver.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// RESOLUTION EVENTS
// ============================================================================

/// Emitted when a run ends with a `Default` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub input_url: String,
    pub resolved_url: String,

    /// Modules that changed the URL ("redirect", "amp2html")
    pub changed_by: Vec<String>,
}

impl UrlResolved {
    pub fn new(input_url: String, resolved_url: String, changed_by: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            input_url,
            resolved_url,
            changed_by,
        }
    }
}

impl DomainEvent for UrlResolved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "UrlResolved" }
}

/// Emitted when a run ends in a terminal failure variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,

    /// Input URL, when one was extracted
    pub input_url: Option<String>,

    pub reason: String,
}

impl ResolutionFailed {
    pub fn new(input_url: Option<String>, reason: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            input_url,
            reason: reason.to_string(),
        }
    }
}

impl DomainEvent for ResolutionFailed {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ResolutionFailed" }
}

// ============================================================================
// MAINTENANCE EVENTS
// ============================================================================

/// Emitted after rows for uninstalled packages were deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleRecordsPruned {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,

    /// "preferred_app" or "app_selection_history"
    pub store: String,

    pub packages: Vec<String>,
    pub rows_removed: usize,
}

impl StaleRecordsPruned {
    pub fn new(store: &str, packages: Vec<String>, rows_removed: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            store: store.to_string(),
            packages,
            rows_removed,
        }
    }
}

impl DomainEvent for StaleRecordsPruned {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StaleRecordsPruned" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_have_unique_ids() {
        let a = ResolutionFailed::new(None, "IntentParseFailed");
        let b = ResolutionFailed::new(None, "IntentParseFailed");
        assert_ne!(a.event_id(), b.event_id());
        assert_eq!(a.event_type(), "ResolutionFailed");
    }

    #[test]
    fn test_events_serialize() {
        let event = StaleRecordsPruned::new("app_selection_history", vec!["com.gone".to_string()], 3);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["store"], "app_selection_history");
        assert_eq!(json["rows_removed"], 3);
    }
}
