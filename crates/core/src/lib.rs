//! `herald-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! aggregate identity, the aggregate traits the event registry consumes, and the
//! pending-event buffer aggregates embed.

pub mod aggregate;
pub mod buffer;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, RecordsEvents};
pub use buffer::DomainEventBuffer;
pub use error::InvalidId;
pub use id::AggregateId;
