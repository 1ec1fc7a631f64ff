//! Button click classification for Vantage keypad buttons
//!
//! Physical buttons report raw press/release edges; automations want
//! gestures. This crate turns the edge stream into three bus events:
//!
//! - `vantage_button_pressed` / `vantage_button_released` — forwarded
//!   immediately, for latency-sensitive automations.
//! - `vantage_button_multipress` — fired once per aggregation window with
//!   the number of presses grouped in it, so a double-tap arrives as one
//!   event with `clicks: 2`.
//!
//! The window is anchored at the first unconsumed press, not at wall-clock
//! ticks: presses at 0.0 s, 0.5 s and 0.9 s form one group of three, and a
//! press at 1.3 s opens a new window.

mod registry;
mod tracker;

pub use registry::ClickTrackerRegistry;
pub use tracker::{ClickTracker, DEFAULT_CLICK_WINDOW};
