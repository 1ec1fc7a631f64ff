//! Core types for the Vantage integration
//!
//! This crate provides the fundamental types used throughout the Vantage
//! integration: Button, Event, Context, and the button gesture event
//! payloads.

mod button;
mod context;
mod event;

pub use button::{Button, ButtonError, ButtonInfo, Keypad};
pub use context::Context;
pub use event::{Event, EventData, EventType};

/// Button gesture event types fired on the integration bus
pub mod events {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use crate::{ButtonInfo, EventData};

    /// Event type for a button press edge
    pub const BUTTON_PRESSED: &str = "vantage_button_pressed";

    /// Event type for a button release edge
    pub const BUTTON_RELEASED: &str = "vantage_button_released";

    /// Event type for a classified multi-press gesture
    pub const BUTTON_MULTIPRESS: &str = "vantage_button_multipress";

    /// Data for BUTTON_PRESSED events
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ButtonPressedData {
        /// The button the press edge came from
        #[serde(flatten)]
        pub button: ButtonInfo,

        /// When the edge was reported
        pub time: DateTime<Utc>,
    }

    impl EventData for ButtonPressedData {
        fn event_type() -> &'static str {
            BUTTON_PRESSED
        }
    }

    /// Data for BUTTON_RELEASED events
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ButtonReleasedData {
        /// The button the release edge came from
        #[serde(flatten)]
        pub button: ButtonInfo,

        /// When the edge was reported
        pub time: DateTime<Utc>,
    }

    impl EventData for ButtonReleasedData {
        fn event_type() -> &'static str {
            BUTTON_RELEASED
        }
    }

    /// Data for BUTTON_MULTIPRESS events
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ButtonMultipressData {
        /// Number of presses grouped into this gesture
        pub clicks: u32,

        /// The button the presses came from
        #[serde(flatten)]
        pub button: ButtonInfo,

        /// When the first press of the group was reported
        pub time: DateTime<Utc>,
    }

    impl EventData for ButtonMultipressData {
        fn event_type() -> &'static str {
            BUTTON_MULTIPRESS
        }
    }

}
