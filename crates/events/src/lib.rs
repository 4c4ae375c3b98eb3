//! Domain events: the `Event` contract and the in-process dispatch registry.
//!
//! Aggregates record events; the application marks them with
//! [`DomainEvents::mark_for_dispatch`] and, once their changes are committed,
//! flushes them to registered handlers with
//! [`DomainEvents::dispatch_events_for_aggregate`].

pub mod error;
pub mod event;
pub mod registry;
pub mod source;

pub use error::DomainEventsError;
pub use event::{Event, EventPayload};
pub use registry::{DomainEvents, Handler};
pub use source::{EventSource, SharedAggregate};
