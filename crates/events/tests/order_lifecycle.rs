//! Black-box lifecycle: an order aggregate records events, is marked, and is
//! flushed to handlers after a (simulated) commit.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use herald_core::{AggregateId, AggregateRoot, DomainEventBuffer, RecordsEvents};
use herald_events::{DomainEvents, DomainEventsError, Event, EventPayload};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
struct OrderId(AggregateId);

impl From<OrderId> for AggregateId {
    fn from(value: OrderId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct OrderPlaced {
    order_id: u64,
    occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct OrderCancelled {
    order_id: u64,
    reason: String,
    occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
enum SalesEvent {
    OrderPlaced(OrderPlaced),
    OrderCancelled(OrderCancelled),
}

impl Event for SalesEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesEvent::OrderPlaced(_) => "OrderPlaced",
            SalesEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

impl EventPayload<SalesEvent> for OrderCancelled {
    const EVENT_TYPE: &'static str = "OrderCancelled";

    fn from_event(event: &SalesEvent) -> Option<&Self> {
        match event {
            SalesEvent::OrderCancelled(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Order {
    id: OrderId,
    number: u64,
    version: u64,
    events: DomainEventBuffer<SalesEvent>,
}

impl Order {
    fn new(number: u64) -> Self {
        Self {
            id: OrderId(AggregateId::new()),
            number,
            version: 0,
            events: DomainEventBuffer::new(),
        }
    }

    fn place(&mut self) {
        self.version += 1;
        self.events.record(SalesEvent::OrderPlaced(OrderPlaced {
            order_id: self.number,
            occurred_at: Utc::now(),
        }));
    }

    fn cancel(&mut self, reason: &str) {
        self.version += 1;
        self.events.record(SalesEvent::OrderCancelled(OrderCancelled {
            order_id: self.number,
            reason: reason.to_string(),
            occurred_at: Utc::now(),
        }));
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl RecordsEvents for Order {
    type Event = SalesEvent;

    fn domain_events(&self) -> &[SalesEvent] {
        self.events.as_slice()
    }

    fn clear_events(&mut self) {
        self.events.clear();
    }
}

fn placed_order(number: u64) -> Arc<Mutex<Order>> {
    let mut order = Order::new(number);
    order.place();
    Arc::new(Mutex::new(order))
}

fn aggregate_id(order: &Arc<Mutex<Order>>) -> AggregateId {
    order.lock().unwrap().id.into()
}

#[test]
fn placed_order_reaches_its_handler_once() {
    herald_observability::init();

    let registry = DomainEvents::new();
    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
    let sink = Arc::clone(&received);
    registry.register("OrderPlaced", move |event: &SalesEvent| {
        sink.lock().unwrap().push(serde_json::to_value(event)?);
        Ok(())
    });

    let order = placed_order(1);
    let id = aggregate_id(&order);
    registry.mark_for_dispatch(&order);

    // The repository would persist the order here; dispatch follows the commit.
    registry.dispatch_events_for_aggregate(&id).unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["OrderPlaced"]["order_id"], serde_json::json!(1));
    assert!(order.lock().unwrap().domain_events().is_empty());
    assert!(!registry.is_marked(&id));
}

#[test]
fn only_the_dispatched_order_is_flushed() {
    let registry = DomainEvents::new();
    let delivered: Arc<Mutex<Vec<u64>>> = Arc::default();
    let sink = Arc::clone(&delivered);
    registry.register("OrderPlaced", move |event: &SalesEvent| {
        if let SalesEvent::OrderPlaced(e) = event {
            sink.lock().unwrap().push(e.order_id);
        }
        Ok(())
    });

    let a = placed_order(10);
    let b = placed_order(20);
    registry.mark_for_dispatch(&a);
    registry.mark_for_dispatch(&b);

    registry.dispatch_events_for_aggregate(&aggregate_id(&a)).unwrap();

    assert_eq!(*delivered.lock().unwrap(), vec![10]);
    assert!(registry.is_marked(&aggregate_id(&b)));
    assert_eq!(b.lock().unwrap().domain_events().len(), 1);
}

#[test]
fn events_of_a_unit_of_work_arrive_in_order() {
    let registry = DomainEvents::new();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    for event_type in ["OrderPlaced", "OrderCancelled"] {
        let sink = Arc::clone(&log);
        registry.register(event_type, move |event: &SalesEvent| {
            sink.lock().unwrap().push(event.event_type());
            Ok(())
        });
    }

    let order = placed_order(3);
    order.lock().unwrap().cancel("customer changed their mind");
    registry.mark_for_dispatch(&order);
    registry.dispatch_events_for_aggregate(&aggregate_id(&order)).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["OrderPlaced", "OrderCancelled"]);
    assert_eq!(order.lock().unwrap().version(), 2);
}

#[test]
fn typed_handler_gets_cancellation_details() {
    let registry = DomainEvents::new();
    let reasons: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&reasons);
    registry.subscribe::<OrderCancelled, _>(move |cancelled| {
        sink.lock().unwrap().push(cancelled.reason.clone());
        Ok(())
    });

    let order = placed_order(4);
    order.lock().unwrap().cancel("out of stock");
    registry.mark_for_dispatch(&order);
    registry.dispatch_events_for_aggregate(&aggregate_id(&order)).unwrap();

    assert_eq!(*reasons.lock().unwrap(), vec!["out of stock".to_string()]);
}

#[test]
fn failed_delivery_can_be_retried_after_fixing_the_handler() {
    let registry = DomainEvents::new();
    let healthy = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&healthy);
    registry.register("OrderPlaced", move |_: &SalesEvent| {
        if !*flag.lock().unwrap() {
            anyhow::bail!("mailer offline");
        }
        Ok(())
    });

    let order = placed_order(5);
    let id = aggregate_id(&order);
    registry.mark_for_dispatch(&order);

    let err = registry.dispatch_events_for_aggregate(&id).unwrap_err();
    assert!(matches!(err, DomainEventsError::Handler { event_type: "OrderPlaced", .. }));
    assert!(registry.is_marked(&id));
    assert_eq!(order.lock().unwrap().domain_events().len(), 1);

    *healthy.lock().unwrap() = true;
    registry.dispatch_events_for_aggregate(&id).unwrap();
    assert!(!registry.is_marked(&id));
    assert!(order.lock().unwrap().domain_events().is_empty());
}
