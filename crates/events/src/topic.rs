//! Bus topics.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A topic on the message bus.
///
/// One topic per pipeline stage transition. Topic names are the wire-level
/// strings used by the broker; the enum keeps routing exhaustive in code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    OrderCreated,
    PaymentCreated,
    PaymentCompleted,
    FulfillmentReady,
    NotificationSend,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(String);

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::OrderCreated,
        Topic::PaymentCreated,
        Topic::PaymentCompleted,
        Topic::FulfillmentReady,
        Topic::NotificationSend,
    ];

    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::OrderCreated => "order.created",
            Topic::PaymentCreated => "payment.created",
            Topic::PaymentCompleted => "payment.completed",
            Topic::FulfillmentReady => "fulfillment.ready",
            Topic::NotificationSend => "notification.send",
        }
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order.created" => Ok(Topic::OrderCreated),
            "payment.created" => Ok(Topic::PaymentCreated),
            "payment.completed" => Ok(Topic::PaymentCompleted),
            "fulfillment.ready" => Ok(Topic::FulfillmentReady),
            "notification.send" => Ok(Topic::NotificationSend),
            other => Err(UnknownTopic(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for topic in Topic::ALL {
            let parsed: Topic = topic.as_str().parse().unwrap();
            assert_eq!(parsed, topic);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("order.deleted".parse::<Topic>().is_err());
    }
}
