/// A domain event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **tagged**: every variant carries a stable type identifier that is the
///   routing key for handlers
/// - **versioned** (schema evolution)
///
/// Applications usually model their events as one enum per bounded context and
/// implement this trait with a `match` returning a constant tag per variant.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "sales.order.placed").
    ///
    /// Handlers registered under this exact string receive the event.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type. Reported alongside the tag when
    /// the event is delivered.
    fn version(&self) -> u32 {
        1
    }
}

/// A single event variant's payload, addressable by its type tag.
///
/// Implementing this for the struct carried by one variant of `E` lets handlers
/// subscribe with [`DomainEvents::subscribe`](crate::DomainEvents::subscribe)
/// and receive `&Self` instead of the whole event enum.
pub trait EventPayload<E: Event>: Sized {
    /// Must equal `event.event_type()` for every event that
    /// [`from_event`](EventPayload::from_event) accepts.
    const EVENT_TYPE: &'static str;

    /// Borrow the payload out of `event`, or `None` for other variants.
    fn from_event(event: &E) -> Option<&Self>;
}
