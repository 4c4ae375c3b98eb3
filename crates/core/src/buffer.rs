//! Pending domain events held by an aggregate.

/// Ordered buffer of events an aggregate recorded but has not yet handed off.
///
/// Aggregates embed one of these and expose it through
/// [`RecordsEvents`](crate::RecordsEvents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEventBuffer<E> {
    events: Vec<E>,
}

impl<E> DomainEventBuffer<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event; recording order is delivery order.
    pub fn record(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Move all events out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

impl<E> Default for DomainEventBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_recording_order() {
        let mut buffer = DomainEventBuffer::new();
        buffer.record("first");
        buffer.record("second");
        buffer.record("third");

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_slice(), &["first", "second", "third"]);
    }

    #[test]
    fn take_empties_the_buffer() {
        let mut buffer = DomainEventBuffer::new();
        buffer.record(1);
        buffer.record(2);

        assert_eq!(buffer.take(), vec![1, 2]);
        assert!(buffer.is_empty());
    }
}
