//! Per-button click tracker
//!
//! Converts the raw press/release edge stream for one physical button into
//! classified gesture events. Press and release edges are forwarded to the
//! bus immediately for latency-sensitive automations; presses are also
//! buffered and, once the aggregation window closes, drained into a single
//! multipress event carrying the press count.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, trace};
use vantage_core::events::{ButtonMultipressData, ButtonPressedData, ButtonReleasedData};
use vantage_core::{Button, Context};
use vantage_event_bus::SharedEventBus;

/// Default aggregation window for grouping presses into one gesture
pub const DEFAULT_CLICK_WINDOW: Duration = Duration::from_secs(1);

/// A buffered press edge awaiting classification
struct PendingPress {
    /// Monotonic arrival time, used for all window arithmetic
    at: Instant,
    /// Wall-clock arrival time, carried in the emitted event
    wall: DateTime<Utc>,
}

/// Classifies one button's press edges into multipress gestures
///
/// One tracker exists per physical button, owned by whatever owns the
/// button's registration and dropped with it. Press counts are transient
/// gesture data and never survive a restart.
///
/// Press edges may arrive on protocol-callback tasks while deferred window
/// checks run on timer tasks; the pending queue is the only shared state and
/// every access to it goes through the mutex. Events are always fired after
/// the guard is dropped so slow subscribers can never extend the critical
/// section.
pub struct ClickTracker {
    button: Button,
    bus: SharedEventBus,
    window: Duration,
    pending: Mutex<VecDeque<PendingPress>>,
}

impl ClickTracker {
    /// Create a tracker with the default aggregation window
    pub fn new(button: Button, bus: SharedEventBus) -> Arc<Self> {
        Self::with_window(button, bus, DEFAULT_CLICK_WINDOW)
    }

    /// Create a tracker with a specific aggregation window
    pub fn with_window(button: Button, bus: SharedEventBus, window: Duration) -> Arc<Self> {
        Arc::new(Self {
            button,
            bus,
            window,
            pending: Mutex::new(VecDeque::new()),
        })
    }

    /// The button this tracker classifies
    pub fn button(&self) -> &Button {
        &self.button
    }

    /// The aggregation window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Handle a press edge reported now
    pub fn on_pressed(self: &Arc<Self>) {
        self.on_pressed_at(Instant::now(), Utc::now());
    }

    /// Handle a press edge with an explicit timestamp
    ///
    /// Fires the immediate pressed event, buffers the press, and schedules a
    /// one-shot deferred check for one window after the press. Every press
    /// schedules its own check and none is ever cancelled; redundant checks
    /// find the queue already drained and do nothing.
    pub fn on_pressed_at(self: &Arc<Self>, at: Instant, time: DateTime<Utc>) {
        self.bus.fire_typed(
            ButtonPressedData {
                button: self.button.info(),
                time,
            },
            Context::new(),
        );

        self.buffer_press(at, time);
        self.schedule_check(at + self.window);
    }

    /// Handle a release edge reported now
    pub fn on_released(&self) {
        self.on_released_at(Utc::now());
    }

    /// Handle a release edge with an explicit timestamp
    ///
    /// Releases are forwarded immediately and take no part in window logic.
    pub fn on_released_at(&self, time: DateTime<Utc>) {
        self.bus.fire_typed(
            ButtonReleasedData {
                button: self.button.info(),
                time,
            },
            Context::new(),
        );
    }

    /// Drain every fully-expired press group and fire a multipress per group
    ///
    /// This is the body of the deferred check; it is public so a host can
    /// force a sweep. The window is anchored at the first unconsumed press:
    /// once that press is a full window old, it and every press less than one
    /// window after it are removed as one group. The loop repeats for the
    /// case where the check ran late and several windows' worth of presses
    /// accumulated, so each group still gets its own event.
    ///
    /// An unexpired head is left alone: the check scheduled by that press
    /// will drain it, so nothing is ever stranded longer than one window past
    /// its arrival.
    pub fn evaluate_window(&self) {
        loop {
            let (clicks, window_start) = {
                let mut pending = self.pending.lock().unwrap();
                let (anchor_at, anchor_wall) = match pending.front() {
                    Some(press) => (press.at, press.wall),
                    None => return,
                };
                if Instant::now().duration_since(anchor_at) < self.window {
                    // Not yet expired; the press's own check owns it.
                    return;
                }

                let mut clicks = 0u32;
                while pending
                    .front()
                    .is_some_and(|press| press.at.duration_since(anchor_at) < self.window)
                {
                    pending.pop_front();
                    clicks += 1;
                }
                (clicks, anchor_wall)
            };

            debug!(button = %self.button, clicks, "Classified multipress");
            self.bus.fire_typed(
                ButtonMultipressData {
                    clicks,
                    button: self.button.info(),
                    time: window_start,
                },
                Context::new(),
            );
        }
    }

    /// Append a press to the pending queue
    fn buffer_press(&self, at: Instant, wall: DateTime<Utc>) {
        let mut pending = self.pending.lock().unwrap();
        pending.push_back(PendingPress { at, wall });
        trace!(button = %self.button, pending = pending.len(), "Buffered press");
    }

    /// Schedule the one-shot deferred window check for this press
    ///
    /// The deadline is fixed before the task is spawned: the check must fire
    /// one window after the press itself, not one window after the scheduler
    /// first polls the task.
    fn schedule_check(self: &Arc<Self>, deadline: Instant) {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tracker.evaluate_window();
        });
    }
}
