// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fan-out of fleet changes to live dashboard subscribers.
//!
//! Every subscriber gets its own receiver; dropping it unsubscribes. A
//! subscriber that falls behind skips the events it missed and keeps going.

use crate::models::{GeoPoint, LoadUpdate, TruckStatus};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const CHANNEL_CAPACITY: usize = 256;

/// A change observed by the backend, published after its write committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FleetEvent {
    LocationUpdated {
        collector_id: String,
        truck_id: Option<String>,
        location: GeoPoint,
        at: DateTime<Utc>,
    },
    ShiftChanged {
        collector_id: String,
        online: bool,
        truck_id: Option<String>,
        truck_status: Option<TruckStatus>,
    },
    AssignmentChanged {
        collector_id: String,
        truck_id: Option<String>,
        released_collector_ids: Vec<String>,
    },
    TruckLoadChanged {
        truck_id: String,
        load: LoadUpdate,
        status: TruckStatus,
    },
}

impl FleetEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::LocationUpdated { .. } => "location_updated",
            FleetEvent::ShiftChanged { .. } => "shift_changed",
            FleetEvent::AssignmentChanged { .. } => "assignment_changed",
            FleetEvent::TruckLoadChanged { .. } => "truck_load_changed",
        }
    }
}

/// Broadcast hub shared through `AppState`.
#[derive(Clone)]
pub struct LiveHub {
    sender: broadcast::Sender<FleetEvent>,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event; returns how many subscribers received it.
    pub fn publish(&self, event: FleetEvent) -> usize {
        let name = event.name();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(event = name, subscribers = delivered, "Fleet event published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// A stream of events from now on. Ends only when the hub is dropped.
    pub fn subscribe(&self) -> impl Stream<Item = FleetEvent> + Send + 'static {
        let receiver = self.sender.subscribe();
        futures_util::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Live subscriber lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn shift(id: &str) -> FleetEvent {
        FleetEvent::ShiftChanged {
            collector_id: id.to_string(),
            online: true,
            truck_id: None,
            truck_status: None,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let hub = LiveHub::new();
        assert_eq!(hub.publish(shift("c1")), 0);
    }

    #[tokio::test]
    async fn test_subscribers_are_independent() {
        let hub = LiveHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        futures_util::pin_mut!(a);
        futures_util::pin_mut!(b);
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(shift("c1"));
        hub.publish(shift("c2"));

        assert_eq!(a.next().await, Some(shift("c1")));
        assert_eq!(a.next().await, Some(shift("c2")));
        assert_eq!(b.next().await, Some(shift("c1")));
    }

    #[tokio::test]
    async fn test_dropping_stream_unsubscribes() {
        let hub = LiveHub::new();
        let stream = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(stream);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(shift("c1")).unwrap();
        assert_eq!(json["type"], "shift_changed");
        assert_eq!(json["collectorId"], "c1");
        assert!(json.get("collector_id").is_none());
    }

    #[test]
    fn test_load_event_fields_are_camel_case() {
        let event = FleetEvent::TruckLoadChanged {
            truck_id: "T-01".to_string(),
            load: LoadUpdate {
                current_load_kg: 1500.0,
                load_percentage: 50,
                became_full: false,
            },
            status: TruckStatus::Active,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "truck_load_changed");
        assert_eq!(json["truckId"], "T-01");
        assert_eq!(json["load"]["loadPercentage"], 50);
    }
}
