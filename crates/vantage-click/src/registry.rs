//! Click tracker registry
//!
//! Owns the per-button trackers for one controller connection, keyed by the
//! button's VID. The component that registers button entities registers a
//! tracker here alongside each of them and unregisters it on teardown, so
//! tracker lifetime is tied to entity lifetime rather than to any global
//! state. The protocol client's edge callbacks dispatch through
//! [`pressed`](ClickTrackerRegistry::pressed) and
//! [`released`](ClickTrackerRegistry::released).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;
use vantage_core::Button;
use vantage_event_bus::SharedEventBus;

use crate::tracker::{ClickTracker, DEFAULT_CLICK_WINDOW};

/// Registry of click trackers for one controller connection
pub struct ClickTrackerRegistry {
    /// Bus that trackers fire gesture events into
    bus: SharedEventBus,

    /// Aggregation window applied to every registered tracker
    window: Duration,

    /// Primary index: button VID -> tracker
    trackers: DashMap<u32, Arc<ClickTracker>>,
}

impl ClickTrackerRegistry {
    /// Create a registry with the default aggregation window
    pub fn new(bus: SharedEventBus) -> Self {
        Self::with_window(bus, DEFAULT_CLICK_WINDOW)
    }

    /// Create a registry with a specific aggregation window
    pub fn with_window(bus: SharedEventBus, window: Duration) -> Self {
        Self {
            bus,
            window,
            trackers: DashMap::new(),
        }
    }

    /// Register a tracker for a button
    ///
    /// Idempotent per VID: registering an already-registered button returns
    /// the existing tracker unchanged.
    pub fn register(&self, button: Button) -> Arc<ClickTracker> {
        let vid = button.vid();
        self.trackers
            .entry(vid)
            .or_insert_with(|| {
                debug!(vid, button = %button, "Registering click tracker");
                ClickTracker::with_window(button, Arc::clone(&self.bus), self.window)
            })
            .clone()
    }

    /// Remove the tracker for a button on entity teardown
    ///
    /// Returns false if no tracker was registered for the VID. In-flight
    /// deferred checks hold their own reference to the tracker and finish
    /// harmlessly after removal.
    pub fn unregister(&self, vid: u32) -> bool {
        let removed = self.trackers.remove(&vid).is_some();
        if removed {
            debug!(vid, "Unregistered click tracker");
        }
        removed
    }

    /// Look up the tracker for a button
    pub fn get(&self, vid: u32) -> Option<Arc<ClickTracker>> {
        self.trackers.get(&vid).map(|t| Arc::clone(t.value()))
    }

    /// Dispatch a press edge from the protocol client
    ///
    /// Returns false for buttons with no registered tracker, which are
    /// ignored.
    pub fn pressed(&self, vid: u32) -> bool {
        match self.trackers.get(&vid) {
            Some(tracker) => {
                tracker.value().on_pressed();
                true
            }
            None => {
                debug!(vid, "Press edge for unregistered button");
                false
            }
        }
    }

    /// Dispatch a release edge from the protocol client
    pub fn released(&self, vid: u32) -> bool {
        match self.trackers.get(&vid) {
            Some(tracker) => {
                tracker.value().on_released();
                true
            }
            None => {
                debug!(vid, "Release edge for unregistered button");
                false
            }
        }
    }

    /// Number of registered trackers
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Whether any trackers are registered
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;
    use vantage_core::events::ButtonMultipressData;
    use vantage_event_bus::EventBus;

    fn button(vid: u32, name: &str) -> Button {
        Button::new(vid, name).unwrap()
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let registry = ClickTrackerRegistry::new(Arc::new(EventBus::new()));

        let first = registry.register(button(10, "porch"));
        let second = registry.register(button(10, "porch"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_lifecycle() {
        let registry = ClickTrackerRegistry::new(Arc::new(EventBus::new()));

        registry.register(button(10, "porch"));
        registry.register(button(11, "den"));
        assert_eq!(registry.len(), 2);

        assert!(registry.unregister(10));
        assert!(!registry.unregister(10));
        assert!(registry.get(10).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_to_unknown_vid() {
        let registry = ClickTrackerRegistry::new(Arc::new(EventBus::new()));

        assert!(!registry.pressed(99));
        assert!(!registry.released(99));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_reaches_tracker() {
        let bus: SharedEventBus = Arc::new(EventBus::new());
        let mut multipress = bus.subscribe_typed::<ButtonMultipressData>();
        let registry = ClickTrackerRegistry::new(bus);

        registry.register(button(10, "porch"));
        assert!(registry.pressed(10));
        assert!(registry.released(10));

        advance(std::time::Duration::from_millis(1000)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let event = multipress.try_recv().unwrap();
        assert_eq!(event.data.clicks, 1);
        assert_eq!(event.data.button.button_vid, 10);
    }
}
