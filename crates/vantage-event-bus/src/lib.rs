//! Event bus with typed pub/sub for the Vantage integration
//!
//! This crate provides the EventBus the integration fires gesture events
//! into. Automations subscribe to event types and receive every event of
//! that type; firing is fire-and-forget and never blocks the producer.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use vantage_core::{Context, Event, EventData, EventType};

/// Default channel capacity for event subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The event bus for publishing and subscribing to events
///
/// The EventBus is the integration's outbound edge. It supports:
/// - Subscribing to specific event types
/// - Subscribing to all events (MATCH_ALL)
/// - Firing events to all subscribers
/// - Typed event subscriptions for type-safe event handling
pub struct EventBus {
    /// Map of event types to their broadcast senders
    listeners: DashMap<EventType, broadcast::Sender<Event<serde_json::Value>>>,
    /// Special sender for MATCH_ALL subscribers
    match_all_sender: broadcast::Sender<Event<serde_json::Value>>,
    /// Channel capacity
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (match_all_sender, _) = broadcast::channel(capacity);
        Self {
            listeners: DashMap::new(),
            match_all_sender,
            capacity,
        }
    }

    /// Subscribe to events of a specific type
    ///
    /// Returns a receiver that will receive all events of the given type.
    /// Dropping the receiver ends the subscription.
    pub fn subscribe(
        &self,
        event_type: impl Into<EventType>,
    ) -> broadcast::Receiver<Event<serde_json::Value>> {
        let event_type = event_type.into();
        trace!(event_type = %event_type, "Subscribing to event type");

        if event_type.is_match_all() {
            return self.match_all_sender.subscribe();
        }

        self.listeners
            .entry(event_type)
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(self.capacity);
                tx
            })
            .subscribe()
    }

    /// Subscribe to events of a specific typed event
    ///
    /// Returns a receiver that will receive events with parsed data.
    pub fn subscribe_typed<T: EventData + serde::de::DeserializeOwned>(
        &self,
    ) -> TypedEventReceiver<T> {
        let rx = self.subscribe(T::event_type());
        TypedEventReceiver::new(rx)
    }

    /// Subscribe to all events
    pub fn subscribe_all(&self) -> broadcast::Receiver<Event<serde_json::Value>> {
        self.match_all_sender.subscribe()
    }

    /// Fire an event to all subscribers
    ///
    /// The event will be delivered to:
    /// 1. All subscribers of the specific event type
    /// 2. All MATCH_ALL subscribers
    pub fn fire(&self, event: Event<serde_json::Value>) {
        debug!(event_type = %event.event_type, "Firing event");

        // Send to specific event type subscribers
        if let Some(sender) = self.listeners.get(&event.event_type) {
            // Ignore send errors - they just mean no active receivers
            let _ = sender.send(event.clone());
        }

        // Send to MATCH_ALL subscribers
        let _ = self.match_all_sender.send(event);
    }

    /// Fire a typed event
    pub fn fire_typed<T: EventData + serde::Serialize>(&self, data: T, context: Context) {
        let event = Event::typed(data, context);
        let json_data = serde_json::to_value(&event.data).unwrap_or_default();
        let event = Event {
            event_type: event.event_type,
            data: json_data,
            time_fired: event.time_fired,
            context: event.context,
        };
        self.fire(event);
    }

    /// Get the number of active event type subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiver for typed events
pub struct TypedEventReceiver<T> {
    rx: broadcast::Receiver<Event<serde_json::Value>>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: EventData + serde::de::DeserializeOwned> TypedEventReceiver<T> {
    fn new(rx: broadcast::Receiver<Event<serde_json::Value>>) -> Self {
        Self {
            rx,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Receive the next typed event
    ///
    /// Events whose data does not parse as `T` are skipped.
    pub async fn recv(&mut self) -> Result<Event<T>, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if let Ok(data) = serde_json::from_value::<T>(event.data.clone()) {
                return Ok(Event {
                    event_type: event.event_type,
                    data,
                    time_fired: event.time_fired,
                    context: event.context,
                });
            }
            // If deserialization failed, try the next event
        }
    }

    /// Receive a typed event without waiting
    pub fn try_recv(&mut self) -> Result<Event<T>, broadcast::error::TryRecvError> {
        loop {
            let event = self.rx.try_recv()?;
            if let Ok(data) = serde_json::from_value::<T>(event.data.clone()) {
                return Ok(Event {
                    event_type: event.event_type,
                    data,
                    time_fired: event.time_fired,
                    context: event.context,
                });
            }
        }
    }
}

/// Thread-safe wrapper for EventBus
pub type SharedEventBus = Arc<EventBus>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use vantage_core::events::{ButtonPressedData, BUTTON_PRESSED};
    use vantage_core::Button;

    #[tokio::test]
    async fn test_subscribe_and_fire() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(BUTTON_PRESSED);

        let ctx = Context::new();
        let event = Event::new(BUTTON_PRESSED, json!({"button": "porch"}), ctx);
        bus.fire(event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type.as_str(), BUTTON_PRESSED);
        assert_eq!(received.data["button"], "porch");
    }

    #[tokio::test]
    async fn test_match_all_subscription() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_all();

        let ctx = Context::new();
        bus.fire(Event::new("event_a", json!({}), ctx.clone()));
        bus.fire(Event::new("event_b", json!({}), ctx));

        let event1 = rx.recv().await.unwrap();
        let event2 = rx.recv().await.unwrap();

        assert_eq!(event1.event_type.as_str(), "event_a");
        assert_eq!(event2.event_type.as_str(), "event_b");
    }

    #[tokio::test]
    async fn test_typed_subscription() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_typed::<ButtonPressedData>();

        let button = Button::new(301, "kitchen_lights").unwrap();
        let data = ButtonPressedData {
            button: button.info(),
            time: Utc::now(),
        };

        bus.fire_typed(data.clone(), Context::new());

        let received = rx.recv().await.unwrap();
        assert_eq!(received.data.button.button, "kitchen_lights");
        assert_eq!(received.data.button.button_vid, 301);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe(BUTTON_PRESSED);
        let mut rx2 = bus.subscribe(BUTTON_PRESSED);

        let ctx = Context::new();
        bus.fire(Event::new(BUTTON_PRESSED, json!({"n": 1}), ctx));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();

        assert_eq!(e1.data["n"], 1);
        assert_eq!(e2.data["n"], 1);
    }

    #[tokio::test]
    async fn test_no_cross_event_pollution() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe("event_a");
        let mut rx_b = bus.subscribe("event_b");

        let ctx = Context::new();
        bus.fire(Event::new("event_a", json!({"type": "a"}), ctx));

        // rx_a should receive the event
        let received = rx_a.recv().await.unwrap();
        assert_eq!(received.data["type"], "a");

        // rx_b should not receive anything
        assert!(rx_b.try_recv().is_err());
    }
}
