// src/events/mod.rs
//
// Internal Event System - Public API
//
// Two kinds of events:
// - Domain events (EventBus): durable facts for in-process subscribers
// - Resolve state (watch channels): progress of the current run

pub mod bus;
pub mod resolve_state;
pub mod types;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

pub use bus::{EventBus, EventLogEntry};
pub use resolve_state::{CancelHandle, ResolveEvent, ResolverChannels, ResolverInteraction};
pub use types::{DomainEvent, ResolutionFailed, StaleRecordsPruned, UrlResolved};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
