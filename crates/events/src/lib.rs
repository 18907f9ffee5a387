//! Document events and their distribution.
//!
//! Rent state changes made by the invoice hooks are described as typed events,
//! wrapped in an [`EventEnvelope`] and published on an [`EventBus`] so that
//! downstream consumers (notifications, audit trails) can react to them.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
