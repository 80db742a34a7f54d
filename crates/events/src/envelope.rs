use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::topic::Topic;

/// Envelope for a published event: topic routing plus transport metadata.
///
/// Notes:
/// - `event_id` identifies the publication, not the business fact; a
///   redelivered message keeps its id, a republished fact gets a new one.
/// - Ordering is per topic partition only; consumers must not assume global
///   order across topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    topic: Topic,
    published_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(topic: Topic, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            topic,
            published_at: Utc::now(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<crate::event::StorefrontEvent> {
    /// Envelope for a lifecycle event, topic derived from the variant.
    pub fn for_event(payload: crate::event::StorefrontEvent) -> Self {
        Self::new(payload.topic(), payload)
    }
}
