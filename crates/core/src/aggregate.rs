//! Aggregate root traits consumed by the domain event registry.

/// Aggregate root marker + minimal interface.
///
/// This is intentionally small so domain modules can decide how they model state
/// transitions without bringing in any infrastructure concerns.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    fn version(&self) -> u64;
}

/// An aggregate that accumulates domain events until they are dispatched.
///
/// Events are kept in the order they were recorded. The owner of the
/// aggregate decides when they are delivered (typically after the aggregate's
/// changes were committed); delivery then clears them via [`clear_events`].
///
/// [`clear_events`]: RecordsEvents::clear_events
pub trait RecordsEvents: AggregateRoot {
    type Event;

    /// Events recorded since the last clear, oldest first.
    fn domain_events(&self) -> &[Self::Event];

    /// Drop every recorded event.
    fn clear_events(&mut self);

    /// Identity equality: two aggregates are the same when their ids match,
    /// whatever their current state.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
