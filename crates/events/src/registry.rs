//! Domain event registry: handler routing plus deferred, per-aggregate dispatch.
//!
//! Aggregates record events while a unit of work runs. Instead of delivering
//! them immediately, the application **marks** the aggregate; once its changes
//! are committed it asks the registry to dispatch that aggregate's events.
//!
//! ```text
//! aggregate.record(e1, e2) ─► mark_for_dispatch(aggregate)
//!                                   │
//!            (persist / commit)     │
//!                                   ▼
//! dispatch_events_for_aggregate(id)
//!     ─► handlers["e1"] ─► handlers["e2"] ─► clear + unmark
//! ```
//!
//! ## Delivery semantics
//!
//! - **Synchronous**: the dispatch call returns after every handler ran.
//! - **Ordered per aggregate**: events are delivered in recording order; the
//!   handlers of one event type run in registration order.
//! - **Fire-and-forget routing**: an event type with no handlers is dropped.
//! - **No cleanup on failure**: when a handler fails, the remaining handlers and
//!   events are skipped and the aggregate stays marked with its events intact,
//!   so dispatching it again redelivers the whole batch.
//!
//! ## Sharing
//!
//! `DomainEvents` is an explicitly constructed context, usually held in an
//! `Arc` by whoever needs to register handlers or mark aggregates. Its internal
//! locks are never held while a handler runs: handlers may register further
//! handlers, mark aggregates, or lock the aggregate being dispatched.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use herald_core::AggregateId;

use crate::error::DomainEventsError;
use crate::event::{Event, EventPayload};
use crate::source::{EventSource, SharedAggregate};

/// A subscriber callback.
pub type Handler<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

struct MarkedAggregate<E> {
    id: AggregateId,
    aggregate: SharedAggregate<E>,
}

/// Registry of event handlers and of aggregates awaiting dispatch.
pub struct DomainEvents<E> {
    handlers: RwLock<HashMap<String, Vec<Handler<E>>>>,
    marked: Mutex<Vec<MarkedAggregate<E>>>,
}

impl<E: Event> DomainEvents<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `aggregate` as holding undispatched events.
    ///
    /// At most one aggregate per identity is tracked: if an aggregate with the
    /// same id is already marked (even a different instance), this is a no-op.
    ///
    /// The aggregate is locked briefly to read its id, so the caller must not
    /// hold that lock while calling.
    pub fn mark_for_dispatch<A>(&self, aggregate: &Arc<Mutex<A>>)
    where
        A: EventSource<E> + 'static,
    {
        let id = aggregate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .source_id();

        let mut marked = self.marked();
        if marked.iter().any(|m| m.id == id) {
            tracing::trace!(aggregate_id = %id, "aggregate already marked for dispatch");
            return;
        }

        let shared: SharedAggregate<E> = aggregate.clone();
        marked.push(MarkedAggregate { id, aggregate: shared });
        tracing::debug!(aggregate_id = %id, marked = marked.len(), "aggregate marked for dispatch");
    }

    /// Subscribe `handler` to every event whose `event_type()` equals `event_type`.
    ///
    /// Handlers for one type run in registration order. Registering the same
    /// callback twice makes it run twice.
    pub fn register<F>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        let mut handlers = self.handlers_mut();
        let subscribers = handlers.entry(event_type.clone()).or_default();
        subscribers.push(Arc::new(handler));
        tracing::debug!(%event_type, handlers = subscribers.len(), "handler registered");
    }

    /// Typed subscription to a single event variant.
    ///
    /// Registered under `P::EVENT_TYPE`, so it is ordered together with plain
    /// [`register`](Self::register) calls for the same type.
    pub fn subscribe<P, F>(&self, handler: F)
    where
        P: EventPayload<E> + 'static,
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(P::EVENT_TYPE, move |event: &E| match P::from_event(event) {
            Some(payload) => handler(payload),
            None => {
                tracing::warn!(
                    event_type = event.event_type(),
                    expected = P::EVENT_TYPE,
                    "event tag does not match its payload; handler skipped"
                );
                Ok(())
            }
        });
    }

    /// Deliver the pending events of the marked aggregate identified by `id`.
    ///
    /// Unknown (or already dispatched) ids are a no-op. On success the
    /// aggregate's events are cleared and it is no longer marked. On failure
    /// nothing is cleared; see [`DomainEventsError`].
    pub fn dispatch_events_for_aggregate(&self, id: &AggregateId) -> Result<(), DomainEventsError> {
        let Some(aggregate) = self.find_marked(id) else {
            tracing::trace!(aggregate_id = %id, "aggregate not marked; nothing to dispatch");
            return Ok(());
        };

        let events: Vec<E> = aggregate
            .lock()
            .map_err(|_| DomainEventsError::Poisoned { aggregate_id: *id })?
            .pending_events()
            .to_vec();

        tracing::debug!(aggregate_id = %id, events = events.len(), "dispatching domain events");

        for event in &events {
            self.dispatch(event).map_err(|source| DomainEventsError::Handler {
                event_type: event.event_type(),
                aggregate_id: *id,
                source,
            })?;
        }

        aggregate
            .lock()
            .map_err(|_| DomainEventsError::Poisoned { aggregate_id: *id })?
            .clear_pending_events();
        self.marked().retain(|m| m.id != *id);

        Ok(())
    }

    /// Remove every handler.
    pub fn clear_handlers(&self) {
        let mut handlers = self.handlers_mut();
        tracing::debug!(event_types = handlers.len(), "clearing handlers");
        handlers.clear();
    }

    /// Forget every marked aggregate without delivering its events.
    pub fn clear_marked_aggregates(&self) {
        let mut marked = self.marked();
        tracing::debug!(discarded = marked.len(), "clearing marked aggregates");
        marked.clear();
    }

    pub fn is_marked(&self, id: &AggregateId) -> bool {
        self.marked().iter().any(|m| m.id == *id)
    }

    pub fn marked_count(&self) -> usize {
        self.marked().len()
    }

    /// Number of handlers registered for `event_type` (0 if none).
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers().get(event_type).map_or(0, Vec::len)
    }

    /// Event types with at least one handler, sorted.
    pub fn registered_event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers().keys().cloned().collect();
        types.sort();
        types
    }

    fn find_marked(&self, id: &AggregateId) -> Option<SharedAggregate<E>> {
        self.marked()
            .iter()
            .find(|m| m.id == *id)
            .map(|m| Arc::clone(&m.aggregate))
    }

    fn dispatch(&self, event: &E) -> anyhow::Result<()> {
        let event_type = event.event_type();

        // Snapshot so handlers can call back into the registry.
        let Some(handlers) = self.handlers().get(event_type).cloned() else {
            tracing::trace!(event_type, "no handlers registered; event dropped");
            return Ok(());
        };

        tracing::trace!(
            event_type,
            version = event.version(),
            handlers = handlers.len(),
            "delivering event"
        );
        for handler in &handlers {
            handler(event)?;
        }
        Ok(())
    }
}

// Registry locks never guard user code, so a poisoned lock still holds
// consistent data.
impl<E> DomainEvents<E> {
    fn handlers(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Handler<E>>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Handler<E>>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn marked(&self) -> MutexGuard<'_, Vec<MarkedAggregate<E>>> {
        self.marked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for DomainEvents<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            marked: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for DomainEvents<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: BTreeMap<String, usize> = self
            .handlers()
            .iter()
            .map(|(event_type, subscribers)| (event_type.clone(), subscribers.len()))
            .collect();
        let marked: Vec<AggregateId> = self.marked().iter().map(|m| m.id).collect();

        f.debug_struct("DomainEvents")
            .field("handlers", &handlers)
            .field("marked", &marked)
            .finish()
    }
}
