use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published event.
///
/// The envelope is the unit handed to the bus: the payload plus a unique
/// event id consumers can use for logging and deduplication. Handlers are
/// idempotent recomputes of current state, so delivery only has to be
/// at-least-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, payload: E) -> Self {
        Self { event_id, payload }
    }

    /// Wrap a payload with a fresh UUIDv7 event id.
    pub fn wrap(payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
