//! Object-safe view of an aggregate holding undispatched events.

use std::sync::{Arc, Mutex};

use herald_core::{AggregateId, RecordsEvents};

/// What the registry needs from a marked aggregate.
///
/// Blanket-implemented for every [`RecordsEvents`] aggregate whose identifier
/// converts into an [`AggregateId`], so domain code only implements the core
/// traits.
pub trait EventSource<E>: Send {
    /// Identity used to find the aggregate in the marked set.
    fn source_id(&self) -> AggregateId;

    /// Undispatched events, in recording order.
    fn pending_events(&self) -> &[E];

    /// Drop every undispatched event.
    fn clear_pending_events(&mut self);
}

impl<A> EventSource<A::Event> for A
where
    A: RecordsEvents + Send,
    A::Id: Copy + Into<AggregateId>,
{
    fn source_id(&self) -> AggregateId {
        (*self.id()).into()
    }

    fn pending_events(&self) -> &[A::Event] {
        self.domain_events()
    }

    fn clear_pending_events(&mut self) {
        self.clear_events();
    }
}

/// Handle the registry keeps for a marked aggregate.
///
/// The caller keeps its own `Arc<Mutex<ConcreteAggregate>>`; both point at the
/// same aggregate, so clearing through this handle is visible to the caller.
pub type SharedAggregate<E> = Arc<Mutex<dyn EventSource<E>>>;
