use thiserror::Error;

use herald_core::AggregateId;

/// Failure while dispatching an aggregate's events.
///
/// Whenever this is returned the aggregate is still marked and its pending
/// events are untouched; the caller decides whether to retry or discard.
#[derive(Debug, Error)]
pub enum DomainEventsError {
    /// A handler returned an error. Remaining handlers for this event and all
    /// later events of the batch were not invoked.
    #[error("handler for `{event_type}` failed while dispatching aggregate {aggregate_id}")]
    Handler {
        event_type: &'static str,
        aggregate_id: AggregateId,
        #[source]
        source: anyhow::Error,
    },

    /// The aggregate's lock was poisoned by a panic elsewhere; its events
    /// cannot be trusted.
    #[error("aggregate {aggregate_id} lock poisoned")]
    Poisoned { aggregate_id: AggregateId },
}
