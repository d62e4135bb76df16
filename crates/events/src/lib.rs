//! `gyaledger-events` — event distribution mechanics.
//!
//! The transaction engine publishes one event per committed mutation; the
//! derived-metrics pipeline consumes them off a bus. This crate holds only
//! the transport-agnostic machinery — the concrete `LedgerEvent` enum lives
//! with the engine that emits it.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
pub use in_memory_bus::InMemoryEventBus;
